//! Parsing of the engine console's discovery output.
//!
//! AssistantSeika's `SeikaSay2` console has two query modes consumed here as
//! plain text:
//!
//! * `-list` — one line per installed voice: `<channel id> <voice name>`.
//! * `-cid <id> -params` — one line per tunable:
//!   `effect : speed = 1 [0.5～4, step 0.01]` (or `emotion :` for the
//!   expressive parameters).
//!
//! Lines that do not match are skipped; the formats carry banner and blank
//! lines around the data.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::ParamFamily;

// ---------------------------------------------------------------------------
// Voice
// ---------------------------------------------------------------------------

/// One installed voice as reported by the engine's list mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// Numeric handle used to address this voice. `None` in degraded mode
    /// (the fallback list), in which case speaking fails at invocation time.
    pub channel_id: Option<u32>,
}

/// Voice names assumed present when the engine cannot be queried.
///
/// Degraded mode: no channel ids are known, so these are display-only until
/// a later enumeration succeeds.
pub const FALLBACK_VOICES: [&str; 5] =
    ["結月ゆかり", "琴葉茜", "琴葉葵", "東北きりたん", "京町セイカ"];

/// Build the degraded fallback voice list.
pub fn fallback_voices() -> Vec<Voice> {
    FALLBACK_VOICES
        .iter()
        .map(|name| Voice {
            name: (*name).to_string(),
            channel_id: None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// DiscoveredParam
// ---------------------------------------------------------------------------

/// One parameter range reported by the engine's params mode, still in the
/// engine's continuous domain. Fed to
/// [`ProfileStore::apply_discovered`](crate::config::ProfileStore::apply_discovered).
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredParam {
    pub family: ParamFamily,
    pub name: String,
    pub default: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

// ---------------------------------------------------------------------------
// Line parsers
// ---------------------------------------------------------------------------

fn voice_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+)\s+(.+?)\s*$").unwrap())
}

fn param_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(effect|emotion)\s*:\s*(.+?)\s*=\s*([-+0-9.eE]+)\s*\[([-+0-9.eE]+)～([-+0-9.eE]+)\s*,\s*step\s*([-+0-9.eE]+)\]\s*$",
        )
        .unwrap()
    })
}

/// Parse one `-list` output line into a [`Voice`].
pub fn parse_voice_line(line: &str) -> Option<Voice> {
    let caps = voice_line_re().captures(line)?;
    let channel_id: u32 = caps[1].parse().ok()?;
    Some(Voice {
        name: caps[2].to_string(),
        channel_id: Some(channel_id),
    })
}

/// Parse the full `-list` output, keeping line order.
pub fn parse_voice_list(output: &str) -> Vec<Voice> {
    output.lines().filter_map(parse_voice_line).collect()
}

/// Parse one `-params` output line into a [`DiscoveredParam`].
pub fn parse_param_line(line: &str) -> Option<DiscoveredParam> {
    let caps = param_line_re().captures(line)?;
    let family = match &caps[1] {
        "effect" => ParamFamily::Effect,
        _ => ParamFamily::Emotion,
    };
    Some(DiscoveredParam {
        family,
        name: caps[2].to_string(),
        default: caps[3].parse().ok()?,
        min: caps[4].parse().ok()?,
        max: caps[5].parse().ok()?,
        step: caps[6].parse().ok()?,
    })
}

/// Parse the full `-params` output, keeping line order.
pub fn parse_params(output: &str) -> Vec<DiscoveredParam> {
    output.lines().filter_map(parse_param_line).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
