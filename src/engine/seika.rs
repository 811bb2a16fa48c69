//! Speech-engine collaborator: trait and AssistantSeika console wrapper.
//!
//! # Overview
//!
//! [`SpeechEngine`] is the narrow contract the playback controller speaks
//! against. It is object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn SpeechEngine>` and called from the playback thread.
//!
//! [`SeikaConsole`] is the production implementation. It shells out to
//! `SeikaSay2.exe` (part of the AssistantSeika install) once per utterance
//! and also exposes the console's two discovery modes, voice enumeration
//! and parameter query.
//!
//! [`MockEngine`] (available under `#[cfg(test)]`) records utterances and
//! can be scripted to fail, for unit-testing the playback controller
//! without an external process.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use thiserror::Error;

use super::discovery::{self, DiscoveredParam, Voice};

/// Console executable name inside the AssistantSeika install directory.
const CONSOLE_EXE: &str = "SeikaSay2.exe";

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// All errors that can arise from the speech-engine subsystem.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The console executable could not be launched at all.
    #[error("failed to launch speech engine: {0}")]
    Spawn(#[from] std::io::Error),

    /// The console ran but exited with a non-zero status.
    #[error("speech engine exited with status {code:?}")]
    Invocation { code: Option<i32> },
}

// ---------------------------------------------------------------------------
// SpeakRequest
// ---------------------------------------------------------------------------

/// One utterance dispatch: a voice channel, the tuned parameter values in
/// the engine's real-valued domain, and the text to speak.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakRequest {
    pub channel_id: u32,
    /// `(effect name, value)` pairs, e.g. `("speed", 1.2)`.
    pub effects: Vec<(String, f64)>,
    /// `(emotion name, value)` pairs, e.g. `("喜び", 0.4)`.
    pub emotions: Vec<(String, f64)>,
    pub text: String,
}

impl SpeakRequest {
    /// A bare request with no parameter overrides.
    pub fn new(channel_id: u32, text: impl Into<String>) -> Self {
        Self {
            channel_id,
            effects: Vec::new(),
            emotions: Vec::new(),
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechEngine trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to the external speech engine.
///
/// # Contract
///
/// - `speak` blocks until the utterance has been fully delivered (or the
///   engine failed). The caller serialises calls; the engine is a
///   single-channel resource per voice and concurrent invocations are not
///   permitted.
/// - No client-side timeout is applied; failures surface only through the
///   engine's own exit status.
pub trait SpeechEngine: Send + Sync {
    /// Deliver one utterance. Success means the engine process exited with
    /// status zero.
    fn speak(&self, request: &SpeakRequest) -> Result<(), EngineError>;
}

// Compile-time assertion: Box<dyn SpeechEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechEngine>) {}
};

// ---------------------------------------------------------------------------
// SeikaConsole
// ---------------------------------------------------------------------------

/// Production engine wrapper around the `SeikaSay2` console.
///
/// Holds no process state — every call spawns a fresh console invocation,
/// so the wrapper can be shared across threads freely.
#[derive(Debug, Clone)]
pub struct SeikaConsole {
    console: PathBuf,
    /// Fixed delay applied after every successful utterance.
    chunk_interval: Duration,
}

impl SeikaConsole {
    /// Create a wrapper for the console under `engine_path` (the
    /// AssistantSeika install directory).
    pub fn new(engine_path: &Path, chunk_interval: Duration) -> Self {
        Self {
            console: engine_path.join(CONSOLE_EXE),
            chunk_interval,
        }
    }

    /// Update the inter-chunk interval (live settings change).
    pub fn set_interval(&mut self, chunk_interval: Duration) {
        self.chunk_interval = chunk_interval;
    }

    /// Enumerate installed voices via the console's `-list` mode.
    ///
    /// Never fails: when the console cannot be run or exits non-zero, the
    /// hardcoded fallback name list is returned instead (degraded mode, no
    /// channel ids — speaking will then fail at invocation time).
    pub fn list_voices(&self) -> Vec<Voice> {
        let output = match Command::new(&self.console).arg("-list").output() {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                log::warn!(
                    "engine: -list exited with {:?}, using fallback voices",
                    output.status.code()
                );
                return discovery::fallback_voices();
            }
            Err(e) => {
                log::warn!("engine: could not run {}: {e}, using fallback voices",
                    self.console.display());
                return discovery::fallback_voices();
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let voices = discovery::parse_voice_list(&stdout);
        if voices.is_empty() {
            log::warn!("engine: -list produced no parseable voices, using fallback");
            return discovery::fallback_voices();
        }
        voices
    }

    /// Query the tunable parameters of one voice channel via `-params`.
    pub fn query_params(&self, channel_id: u32) -> Result<Vec<DiscoveredParam>, EngineError> {
        let output = Command::new(&self.console)
            .arg("-cid")
            .arg(channel_id.to_string())
            .arg("-params")
            .output()?;

        if !output.status.success() {
            return Err(EngineError::Invocation {
                code: output.status.code(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(discovery::parse_params(&stdout))
    }
}

impl SpeechEngine for SeikaConsole {
    fn speak(&self, request: &SpeakRequest) -> Result<(), EngineError> {
        let mut cmd = Command::new(&self.console);
        cmd.arg("-cid").arg(request.channel_id.to_string());

        for (name, value) in &request.effects {
            cmd.arg(format!("-{name}")).arg(value.to_string());
        }
        for (name, value) in &request.emotions {
            cmd.arg("-emotion").arg(name).arg(value.to_string());
        }

        // The console treats the utterance as one line.
        cmd.arg("-t").arg(request.text.replace('\n', " "));

        let status = cmd.status()?;
        if !status.success() {
            return Err(EngineError::Invocation {
                code: status.code(),
            });
        }

        std::thread::sleep(self.chunk_interval);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockEngine  (test-only)
// ---------------------------------------------------------------------------

/// A test double that records every utterance and can be scripted to fail
/// on the n-th call.
#[cfg(test)]
pub struct MockEngine {
    utterances: std::sync::Mutex<Vec<String>>,
    calls: std::sync::atomic::AtomicUsize,
    fail_at: Option<usize>,
    delay: Duration,
}

#[cfg(test)]
impl MockEngine {
    /// An engine that always succeeds instantly.
    pub fn ok() -> Self {
        Self {
            utterances: std::sync::Mutex::new(Vec::new()),
            calls: std::sync::atomic::AtomicUsize::new(0),
            fail_at: None,
            delay: Duration::ZERO,
        }
    }

    /// An engine that fails on the zero-based `index`-th call.
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::ok()
        }
    }

    /// An engine whose every call takes `delay` — for pause/stop timing
    /// tests.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::ok()
        }
    }

    /// Utterances delivered so far, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.utterances.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl SpeechEngine for MockEngine {
    fn speak(&self, request: &SpeakRequest) -> Result<(), EngineError> {
        let index = self
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        if self.fail_at == Some(index) {
            return Err(EngineError::Invocation { code: Some(1) });
        }

        self.utterances.lock().unwrap().push(request.text.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
