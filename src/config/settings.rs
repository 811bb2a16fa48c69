//! Application settings and JSON persistence.
//!
//! [`AppConfig`] aggregates everything the reader remembers between
//! sessions: the last URL and local file, the engine install path, the
//! selected voice, chunking parameters, and the full per-voice parameter
//! profiles ([`ProfileStore`]).
//!
//! The on-disk format is `config.json`. An older flat layout (top-level
//! `speed_min` / `speed_max` / `speed_val` / `speed_step` and the `volume_*`
//! equivalents, next to a `voice` field) is still accepted on load and
//! migrated into a nested profile for that voice.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::profile::{ParamFamily, ProfileStore};
use super::AppPaths;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors raised while loading or saving the settings document.
///
/// A load failure is never fatal: callers fall back to in-memory defaults
/// and surface a warning.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read or write settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed settings document: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Default AssistantSeika install directory on Windows.
const DEFAULT_ENGINE_PATH: &str = "C:/Program Files/510Product/AssistantSeika";

/// Top-level application configuration, serialised as `config.json`.
///
/// # Persistence
///
/// ```rust,no_run
/// use aozora_reader::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Last-used Aozora Bunko work URL.
    pub url: Option<String>,
    /// Last-used local text file.
    pub file_path: Option<PathBuf>,
    /// AssistantSeika install directory (contains `SeikaSay2.exe`).
    pub engine_path: PathBuf,
    /// Selected voice name.
    pub voice: Option<String>,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Pause between chunks, in seconds.
    pub interval: f64,
    /// Per-voice effect/emotion parameter profiles.
    pub profiles: ProfileStore,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: None,
            file_path: None,
            engine_path: PathBuf::from(DEFAULT_ENGINE_PATH),
            voice: None,
            chunk_size: 100,
            interval: 0.5,
            profiles: ProfileStore::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `config.json`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let raw: serde_json::Value = serde_json::from_str(&content)?;
        Ok(Self::from_document(raw)?)
    }

    /// Save configuration to the platform-appropriate `config.json`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Legacy migration
    // -----------------------------------------------------------------------

    /// Deserialise a settings document, mapping the old flat format into a
    /// nested voice profile when necessary.
    fn from_document(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut config: AppConfig = serde_json::from_value(raw.clone())?;

        // Old documents carry flat `speed_*` / `volume_*` keys instead of a
        // `profiles` map. They only ever described the selected voice.
        if config.profiles.is_empty() {
            if let (Some(voice), Some(doc)) = (config.voice.clone(), raw.as_object()) {
                for name in ["speed", "volume"] {
                    if let Some((min, max, value, step)) = read_flat_param(doc, name) {
                        log::info!("config: migrating legacy {name} settings for {voice}");
                        let param = super::profile::VoiceParameter {
                            min,
                            max,
                            value,
                            scale: if step > 0.0 { 1.0 / step } else { 1.0 },
                        };
                        config
                            .profiles
                            .profile_mut(&voice)
                            .effects
                            .insert(name.to_string(), param);
                    }
                }
            }
        }

        Ok(config)
    }

    /// Convenience: the real-valued effect setting for the selected voice.
    pub fn effect_value(&self, name: &str) -> Option<f64> {
        let voice = self.voice.as_deref()?;
        self.profiles.display_value(voice, name, ParamFamily::Effect)
    }
}

/// Read one legacy flat parameter (`<name>_min`, `<name>_max`, `<name>_val`,
/// `<name>_step`). All four keys must be present for the migration to apply.
fn read_flat_param(
    doc: &serde_json::Map<String, serde_json::Value>,
    name: &str,
) -> Option<(i64, i64, i64, f64)> {
    let min = doc.get(&format!("{name}_min"))?.as_i64()?;
    let max = doc.get(&format!("{name}_max"))?.as_i64()?;
    let value = doc.get(&format!("{name}_val"))?.as_i64()?;
    let step = doc.get(&format!("{name}_step"))?.as_f64()?;
    Some((min, max, value, step))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
