//! Aozora reader — reads Aozora Bunko works aloud through an external
//! speech engine.
//!
//! # Architecture
//!
//! ```text
//! fetch  ── URL / local file ──▶ Document (text, title, author)
//!                                   │
//! text   ── split_into_chunks ──▶ Vec<String>  (speech-sized chunks)
//!                                   │
//! playback ── PlaybackController ──▶ one SpeechEngine::speak per chunk
//!                 │                         │
//!                 │                         └─ engine: SeikaSay2 console
//!                 └─▶ PlaybackEvent stream → front end
//!
//! config ── AppConfig + per-voice parameter profiles, persisted as JSON
//! ```
//!
//! The speech engine, the HTML structure of Aozora Bunko, and the settings
//! document are external collaborators with narrow contracts; the chunking
//! algorithm and the playback state machine are the substance of this
//! crate.

pub mod config;
pub mod engine;
pub mod fetch;
pub mod playback;
pub mod text;
