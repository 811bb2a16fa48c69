//! Configuration module for the Aozora reader.
//!
//! Provides `AppConfig` (top-level settings), the per-voice parameter
//! profiles (`ProfileStore`), `AppPaths` for cross-platform data
//! directories, and JSON persistence via `AppConfig::load` /
//! `AppConfig::save`.

pub mod paths;
pub mod profile;
pub mod settings;

pub use paths::AppPaths;
pub use profile::{ParamFamily, ProfileStore, VoiceParameter, VoiceProfile};
pub use settings::{AppConfig, ConfigError};
