//! Per-voice parameter profiles.
//!
//! The speech engine reports each tunable as a continuous
//! `default [min～max, step]` range. UI controls want integer steps, so every
//! parameter is held in a fixed-point integer domain with
//! `scale = 1 / step` and `value = round(real * scale)`.
//!
//! Two independent parameter families exist per voice: **effects** (speed,
//! volume, pitch, …) and **emotions** (an open-ended, engine-defined set).
//! Both have the same shape and live in separate namespaces.
//!
//! Profiles are created lazily the first time a voice's parameters are
//! applied, via explicit get-or-create accessors — reads never mutate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ParamFamily
// ---------------------------------------------------------------------------

/// Which namespace a parameter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamFamily {
    /// Continuous voice effects: speed, volume, pitch, alpha, intonation.
    Effect,
    /// Named expressive intensities (喜び, 怒り, …); set varies per voice.
    Emotion,
}

// ---------------------------------------------------------------------------
// VoiceParameter
// ---------------------------------------------------------------------------

/// One tunable parameter in the fixed-point integer domain.
///
/// Invariant: `min <= value <= max`, maintained by
/// [`ProfileStore::apply_discovered`]. A direct [`ProfileStore::set_value`]
/// is not clamped — the UI control's own range is expected to enforce the
/// bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceParameter {
    pub min: i64,
    pub max: i64,
    pub value: i64,
    /// Multiplicative factor converting the engine's real-valued step into
    /// an integer step: `scale = 1 / step`.
    pub scale: f64,
}

impl VoiceParameter {
    /// The real-valued parameter as the engine expects it.
    pub fn display_value(&self) -> f64 {
        self.value as f64 / self.scale
    }
}

// ---------------------------------------------------------------------------
// VoiceProfile
// ---------------------------------------------------------------------------

/// All tunables for one voice, split by family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    #[serde(default)]
    pub effects: BTreeMap<String, VoiceParameter>,
    #[serde(default)]
    pub emotions: BTreeMap<String, VoiceParameter>,
}

impl VoiceProfile {
    fn family(&self, family: ParamFamily) -> &BTreeMap<String, VoiceParameter> {
        match family {
            ParamFamily::Effect => &self.effects,
            ParamFamily::Emotion => &self.emotions,
        }
    }

    fn family_mut(&mut self, family: ParamFamily) -> &mut BTreeMap<String, VoiceParameter> {
        match family {
            ParamFamily::Effect => &mut self.effects,
            ParamFamily::Emotion => &mut self.emotions,
        }
    }
}

// ---------------------------------------------------------------------------
// ProfileStore
// ---------------------------------------------------------------------------

/// Map of voice name → [`VoiceProfile`], persisted inside the settings
/// document so tuned values survive across sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileStore {
    voices: BTreeMap<String, VoiceProfile>,
}

impl ProfileStore {
    /// Profile for `voice`, if that voice has ever been queried.
    pub fn profile(&self, voice: &str) -> Option<&VoiceProfile> {
        self.voices.get(voice)
    }

    /// Get-or-create accessor for `voice`'s profile.
    pub fn profile_mut(&mut self, voice: &str) -> &mut VoiceProfile {
        self.voices.entry(voice.to_string()).or_default()
    }

    /// Look up a single parameter. Absence means the voice (or that
    /// parameter) was never discovered — distinct from a zero value.
    pub fn param(&self, voice: &str, name: &str, family: ParamFamily) -> Option<&VoiceParameter> {
        self.profile(voice).and_then(|p| p.family(family).get(name))
    }

    /// Fold one engine-reported parameter range into the store.
    ///
    /// Converts the continuous `default/min/max/step` into the integer
    /// domain. A previously stored value wins over the freshly reported
    /// default, but is clamped into the new `[min, max]` in case the
    /// engine-reported range changed since it was saved.
    pub fn apply_discovered(
        &mut self,
        voice: &str,
        name: &str,
        family: ParamFamily,
        default: f64,
        min: f64,
        max: f64,
        step: f64,
    ) {
        let scale = if step > 0.0 {
            1.0 / step
        } else {
            log::warn!("profile: non-positive step {step} for {voice}/{name}, assuming 1.0");
            1.0
        };

        let min_i = (min * scale).round() as i64;
        let max_i = (max * scale).round() as i64;
        let default_i = (default * scale).round() as i64;

        let params = self.profile_mut(voice).family_mut(family);
        match params.get_mut(name) {
            Some(existing) => {
                existing.value = existing.value.clamp(min_i, max_i);
                existing.min = min_i;
                existing.max = max_i;
                existing.scale = scale;
            }
            None => {
                params.insert(
                    name.to_string(),
                    VoiceParameter {
                        min: min_i,
                        max: max_i,
                        value: default_i,
                        scale,
                    },
                );
            }
        }
    }

    /// Store a raw integer value for an already-discovered parameter.
    ///
    /// No clamping is applied. Returns `false` (with a warning) when the
    /// parameter is unknown — values can only be set after discovery.
    pub fn set_value(&mut self, voice: &str, name: &str, family: ParamFamily, raw: i64) -> bool {
        match self
            .voices
            .get_mut(voice)
            .and_then(|p| p.family_mut(family).get_mut(name))
        {
            Some(param) => {
                param.value = raw;
                true
            }
            None => {
                log::warn!("profile: set_value for undiscovered parameter {voice}/{name}");
                false
            }
        }
    }

    /// The real-valued setting for a parameter, or `None` if never
    /// discovered.
    pub fn display_value(&self, voice: &str, name: &str, family: ParamFamily) -> Option<f64> {
        self.param(voice, name, family).map(VoiceParameter::display_value)
    }

    /// Voice names with stored profiles, in sorted order.
    pub fn voice_names(&self) -> impl Iterator<Item = &str> {
        self.voices.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
