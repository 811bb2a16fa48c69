//! Aozora Bunko page fetch and content extraction.
//!
//! Work pages are served as Shift_JIS HTML. The interesting parts:
//!
//! * `h1.title` / `h2.author` — metadata, extracted best-effort.
//! * `div.main_text` — the body. Ruby annotations (`<ruby>` with `<rt>`
//!   readings and `<rp>` fallback parens) are flattened to their base text;
//!   the readings themselves must not leak into the spoken output.
//!
//! Extraction is a pure function over the HTML string
//! ([`extract_document`]) so it can be tested without any network.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use super::{Document, FetchError, TextFetcher};

const UNKNOWN_TITLE: &str = "タイトル不明";
const UNKNOWN_AUTHOR: &str = "作者不明";

// ---------------------------------------------------------------------------
// AozoraFetcher
// ---------------------------------------------------------------------------

/// Production fetcher for Aozora Bunko work pages.
#[derive(Debug, Clone)]
pub struct AozoraFetcher {
    client: reqwest::Client,
}

impl AozoraFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl Default for AozoraFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextFetcher for AozoraFetcher {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        log::info!("fetch: GET {url}");
        let response = self.client.get(url).send().await?;
        // Aozora Bunko serves Shift_JIS regardless of what headers claim.
        let html = response.text_with_charset("shift_jis").await?;
        extract_document(&html)
    }
}

// ---------------------------------------------------------------------------
// HTML extraction
// ---------------------------------------------------------------------------

fn selector(css: &'static str, cell: &'static OnceLock<Selector>) -> &'static Selector {
    cell.get_or_init(|| Selector::parse(css).expect("static selector"))
}

fn title_selector() -> &'static Selector {
    static CELL: OnceLock<Selector> = OnceLock::new();
    selector("h1.title", &CELL)
}

fn author_selector() -> &'static Selector {
    static CELL: OnceLock<Selector> = OnceLock::new();
    selector("h2.author", &CELL)
}

fn main_text_selector() -> &'static Selector {
    static CELL: OnceLock<Selector> = OnceLock::new();
    selector("div.main_text", &CELL)
}

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

/// Extract body text, title and author from a work page.
///
/// A page without `div.main_text` yields [`FetchError::MissingBody`] that
/// still carries whatever title/author could be found.
pub fn extract_document(html: &str) -> Result<Document, FetchError> {
    let page = Html::parse_document(html);

    let title = element_text(&page, title_selector()).unwrap_or_else(|| UNKNOWN_TITLE.into());
    let author = element_text(&page, author_selector()).unwrap_or_else(|| UNKNOWN_AUTHOR.into());

    let Some(main) = page.select(main_text_selector()).next() else {
        return Err(FetchError::MissingBody { title, author });
    };

    let mut text = String::new();
    collect_text(main, &mut text);

    // Collapse runs of blank lines so paragraph splitting sees exactly one
    // blank line per paragraph break.
    let text = blank_run_re().replace_all(&text, "\n\n").into_owned();

    Ok(Document {
        text,
        title,
        author,
    })
}

fn element_text(page: &Html, sel: &Selector) -> Option<String> {
    page.select(sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Depth-first text collection that drops ruby reading (`rt`) and fallback
/// paren (`rp`) subtrees, leaving the base text of each `<ruby>` in place.
fn collect_text(root: ElementRef<'_>, out: &mut String) {
    let mut stack: Vec<_> = root.children().rev().collect();
    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => out.push_str(&text.text),
            Node::Element(el) => {
                if el.name() != "rt" && el.name() != "rp" {
                    stack.extend(node.children().rev());
                }
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> String {
        format!(
            "<html><head><title>t</title></head><body>\
             <h1 class=\"title\">吾輩は猫である</h1>\
             <h2 class=\"author\">夏目漱石</h2>\
             {body}</body></html>"
        )
    }

    #[test]
    fn extracts_title_author_and_body() {
        let html = page("<div class=\"main_text\">吾輩は猫である。名前はまだ無い。</div>");
        let doc = extract_document(&html).unwrap();
        assert_eq!(doc.title, "吾輩は猫である");
        assert_eq!(doc.author, "夏目漱石");
        assert_eq!(doc.text, "吾輩は猫である。名前はまだ無い。");
    }

    #[test]
    fn ruby_readings_are_stripped_base_text_kept() {
        let html = page(
            "<div class=\"main_text\">どこで<ruby><rb>生</rb><rp>（</rp><rt>うま</rt><rp>）</rp></ruby>れたか</div>",
        );
        let doc = extract_document(&html).unwrap();
        assert_eq!(doc.text, "どこで生れたか");
    }

    #[test]
    fn ruby_without_rb_keeps_inline_base() {
        // Some pages omit <rb> and put the base text directly in <ruby>.
        let html =
            page("<div class=\"main_text\"><ruby>薄暗い<rt>うすぐらい</rt></ruby>所</div>");
        let doc = extract_document(&html).unwrap();
        assert_eq!(doc.text, "薄暗い所");
    }

    #[test]
    fn blank_line_runs_collapse_to_one_paragraph_break() {
        let html = page("<div class=\"main_text\">一行目\n\n\n\n二行目</div>");
        let doc = extract_document(&html).unwrap();
        assert_eq!(doc.text, "一行目\n\n二行目");
    }

    #[test]
    fn missing_main_text_keeps_best_effort_metadata() {
        let html = page("<div class=\"other\">nothing here</div>");
        let err = extract_document(&html).unwrap_err();
        match err {
            FetchError::MissingBody { title, author } => {
                assert_eq!(title, "吾輩は猫である");
                assert_eq!(author, "夏目漱石");
            }
            other => panic!("expected MissingBody, got {other:?}"),
        }
    }

    #[test]
    fn missing_metadata_falls_back_to_placeholders() {
        let html = "<html><body><p>not an aozora page</p></body></html>";
        let err = extract_document(html).unwrap_err();
        match err {
            FetchError::MissingBody { title, author } => {
                assert_eq!(title, UNKNOWN_TITLE);
                assert_eq!(author, UNKNOWN_AUTHOR);
            }
            other => panic!("expected MissingBody, got {other:?}"),
        }
    }

    #[test]
    fn nested_markup_inside_main_text_is_flattened() {
        let html = page(
            "<div class=\"main_text\"><em>強調</em>と<span class=\"x\">装飾</span>が混ざる</div>",
        );
        let doc = extract_document(&html).unwrap();
        assert_eq!(doc.text, "強調と装飾が混ざる");
    }
}
