//! Sequential playback of text chunks through the speech engine.
//!
//! # Architecture
//!
//! ```text
//! PlaybackController::start(chunks, template, tx)
//!        │
//!        ▼
//! "playback" thread ── one SpeechEngine::speak per chunk
//!        │                    │
//!        │                    └─▶ PlaybackEvent (std::sync::mpsc) → observer
//!        │
//! PlaybackFlags (Arc) ←── pause()/resume()/stop() from the control thread
//! ```
//!
//! The loop is blocking by design (the engine call is synchronous), so it
//! lives on a dedicated OS thread rather than the async runtime.

pub mod controller;
pub mod state;

pub use controller::{PlaybackController, PlaybackError, PAUSE_POLL_INTERVAL};
pub use state::{PlaybackEvent, PlaybackFlags, SharedFlags};
