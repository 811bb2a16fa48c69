//! Paragraph- and sentence-aware chunking of narrative text.
//!
//! [`split_into_chunks`] cuts a source text into speech-sized pieces so that
//! each piece can be handed to the speech engine as a single utterance.
//! Paragraphs (separated by a blank line) are kept together when they fit;
//! paragraphs longer than the limit are broken at sentence delimiters, with
//! each delimiter kept attached to the text it terminates.
//!
//! All sizes are **character** counts, not byte counts — the input is
//! predominantly Japanese and a byte budget would cut the limit to a third.

/// Sentence delimiters recognised inside an oversized paragraph.
///
/// A delimiter always binds to the preceding text: `"ある日。次の日"` splits
/// into `"ある日。"` and `"次の日"`, never `"ある日"` / `"。次の日"`.
const SENTENCE_DELIMITERS: [char; 6] = ['。', '、', '！', '？', ',', '.'];

/// Separator inserted between whole paragraphs merged into one chunk.
/// Counts as two characters against the chunk budget.
const PARAGRAPH_JOIN: &str = "\n\n";

// ---------------------------------------------------------------------------
// split_into_chunks
// ---------------------------------------------------------------------------

/// Split `text` into an ordered sequence of chunks of at most
/// `max_chunk_size` characters each.
///
/// The only exception to the size bound is a single indivisible unit (a
/// paragraph with no sentence delimiters, or one run-on sentence) that alone
/// exceeds the limit: it is emitted as its own oversized chunk rather than
/// cut mid-word.
///
/// Pure and deterministic. Empty input yields an empty vector.
///
/// ```
/// use aozora_reader::text::split_into_chunks;
///
/// let chunks = split_into_chunks("A short line.\n\nAnother short line.", 100);
/// assert_eq!(chunks, vec!["A short line.\n\nAnother short line."]);
/// ```
pub fn split_into_chunks(text: &str, max_chunk_size: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize; // chars, tracked to avoid rescanning

    for paragraph in text.split(PARAGRAPH_JOIN) {
        let para_len = paragraph.chars().count();

        if para_len > max_chunk_size {
            // Oversized paragraph: merge at sentence granularity, no join
            // separator between sentence units.
            for unit in sentence_units(paragraph) {
                let unit_len = unit.chars().count();
                if current_len + unit_len <= max_chunk_size {
                    current.push_str(unit);
                    current_len += unit_len;
                } else {
                    if !current.is_empty() {
                        chunks.push(std::mem::take(&mut current));
                    }
                    current.push_str(unit);
                    current_len = unit_len;
                }
            }
        } else {
            // Whole paragraph is one appendable unit; the two-character
            // separator counts against the budget only when joining.
            let join = if current.is_empty() { 0 } else { 2 };
            if current_len + para_len + join <= max_chunk_size {
                if !current.is_empty() {
                    current.push_str(PARAGRAPH_JOIN);
                }
                current.push_str(paragraph);
                current_len += para_len + join;
            } else {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                current.push_str(paragraph);
                current_len = para_len;
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

// ---------------------------------------------------------------------------
// Sentence units
// ---------------------------------------------------------------------------

/// Split a paragraph into sentence-like units, each ending with (and owning)
/// the delimiter that terminated it. The final unit may lack a delimiter.
fn sentence_units(paragraph: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;

    for (i, c) in paragraph.char_indices() {
        if SENTENCE_DELIMITERS.contains(&c) {
            let end = i + c.len_utf8();
            units.push(&paragraph[start..end]);
            start = end;
        }
    }

    if start < paragraph.len() {
        units.push(&paragraph[start..]);
    }

    units
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // --- sentence_units ---

    #[test]
    fn delimiter_binds_to_preceding_text() {
        let units = sentence_units("ある日。次の日、その後");
        assert_eq!(units, vec!["ある日。", "次の日、", "その後"]);
    }

    #[test]
    fn ascii_delimiters_are_recognised() {
        let units = sentence_units("one. two, three");
        assert_eq!(units, vec!["one.", " two,", " three"]);
    }

    #[test]
    fn consecutive_delimiters_become_single_char_units() {
        let units = sentence_units("ええ。。");
        assert_eq!(units, vec!["ええ。", "。"]);
    }

    #[test]
    fn paragraph_without_delimiters_is_one_unit() {
        let units = sentence_units("途切れない長い呟き");
        assert_eq!(units, vec!["途切れない長い呟き"]);
    }

    // --- split_into_chunks: basics ---

    #[test]
    fn empty_input_yields_empty_sequence() {
        assert!(split_into_chunks("", 100).is_empty());
    }

    #[test]
    fn short_paragraphs_merge_into_one_chunk() {
        let chunks = split_into_chunks("A short line.\n\nAnother short line.", 100);
        assert_eq!(chunks, vec!["A short line.\n\nAnother short line."]);
    }

    #[test]
    fn paragraphs_split_when_join_exceeds_budget() {
        // 10 + 2 + 10 > 20, so the second paragraph starts a new chunk.
        let a = "a".repeat(10);
        let b = "b".repeat(10);
        let text = format!("{a}\n\n{b}");
        let chunks = split_into_chunks(&text, 20);
        assert_eq!(chunks, vec![a, b]);
    }

    #[test]
    fn join_separator_counts_two_characters() {
        // 9 + 2 + 9 = 20 exactly fits.
        let a = "a".repeat(9);
        let b = "b".repeat(9);
        let text = format!("{a}\n\n{b}");
        let chunks = split_into_chunks(&text, 20);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], format!("{a}\n\n{b}"));
    }

    // --- split_into_chunks: oversized paragraphs ---

    #[test]
    fn long_paragraph_splits_at_sentence_boundary() {
        // Worked example: 50 A's, a 。, 50 B's with a budget of 60.
        let text = format!("{}。{}", "A".repeat(50), "B".repeat(50));
        let chunks = split_into_chunks(&text, 60);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].ends_with('。'));
        assert_eq!(chunks[0].chars().count(), 51);
        assert_eq!(chunks[1], "B".repeat(50));
    }

    #[test]
    fn indivisible_unit_exceeding_budget_is_kept_whole() {
        // No delimiters at all: the unit cannot be split further and is
        // emitted as a single oversized chunk. Accepted behaviour.
        let text = "x".repeat(500);
        let chunks = split_into_chunks(&text, 100);
        assert_eq!(chunks, vec!["x".repeat(500)]);
    }

    #[test]
    fn sentences_merge_without_join_separator() {
        // One oversized paragraph whose sentences re-merge under the budget:
        // no "\n\n" must appear inside the resulting chunks.
        let text = format!("{}。{}。{}。", "あ".repeat(30), "い".repeat(30), "う".repeat(30));
        let chunks = split_into_chunks(&text, 70);
        assert!(chunks.iter().all(|c| !c.contains('\n')));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 62);
        assert_eq!(chunks[1].chars().count(), 31);
    }

    // --- testable properties ---

    #[test]
    fn chunks_respect_size_bound_or_are_indivisible() {
        let text = "吾輩は猫である。名前はまだ無い。どこで生れたかとんと見当がつかぬ。\
                    \n\n何でも薄暗いじめじめした所でニャーニャー泣いていた事だけは記憶している。";
        for max in [10usize, 25, 40, 80] {
            for chunk in split_into_chunks(text, max) {
                let len = chunk.chars().count();
                // Either within budget, or a single indivisible unit.
                assert!(
                    len <= max || sentence_units(&chunk).len() == 1,
                    "chunk of {len} chars breaks the {max} budget and is divisible"
                );
            }
        }
    }

    #[test]
    fn concatenation_preserves_source_order() {
        let text = "一つ目の段落。まだ続く。\n\n二つ目の段落。\n\n三つ目。";
        let chunks = split_into_chunks(text, 12);
        let rejoined: String = chunks.join("");
        // Paragraph separators may be dropped at chunk boundaries, but the
        // remaining characters must appear in source order with nothing lost.
        let source_flat: String = text.chars().filter(|c| *c != '\n').collect();
        let rejoined_flat: String = rejoined.chars().filter(|c| *c != '\n').collect();
        assert_eq!(source_flat, rejoined_flat);
    }

    #[test]
    fn resplitting_is_idempotent() {
        let text = "春はあけぼの。やうやう白くなりゆく山ぎは、すこしあかりて、\
                    紫だちたる雲のほそくたなびきたる。\n\n夏は夜。月のころはさらなり。";
        let first = split_into_chunks(text, 30);
        let second = split_into_chunks(text, 30);
        assert_eq!(first, second);
    }

    #[test]
    fn blank_only_input_yields_nothing() {
        assert!(split_into_chunks("\n\n", 50).is_empty());
        assert!(split_into_chunks("\n\n\n\n", 50).is_empty());
    }
}
