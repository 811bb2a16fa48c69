//! Speech-engine collaborator.
//!
//! The engine is an external console program, treated strictly as a
//! collaborator with a narrow contract: one invocation per utterance, plus
//! two query modes (voice list, parameter discovery) consumed as plain
//! text.

pub mod discovery;
pub mod seika;

pub use discovery::{fallback_voices, DiscoveredParam, Voice, FALLBACK_VOICES};
pub use seika::{EngineError, SeikaConsole, SpeakRequest, SpeechEngine};

#[cfg(test)]
pub use seika::MockEngine;
