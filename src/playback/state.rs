//! Shared playback flags and progress events.
//!
//! [`PlaybackFlags`] replaces the ambient `is_reading` / `pause_reading`
//! globals of a naive design with an explicit object shared by `Arc`: the
//! playback thread mutates it, the controlling thread reads it, one atomic
//! per field so neither side ever blocks the other.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// PlaybackFlags
// ---------------------------------------------------------------------------

/// Live state of one playback run.
///
/// `position` is monotonically non-decreasing while `running` is set and
/// resets to 0 only when a new run starts. `paused` is meaningful only
/// while `running` is set.
#[derive(Debug, Default)]
pub struct PlaybackFlags {
    running: AtomicBool,
    paused: AtomicBool,
    position: AtomicUsize,
}

impl PlaybackFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Index of the next chunk to dispatch (equals the number of chunks
    /// completed so far).
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }

    pub(crate) fn set_running(&self, value: bool) {
        self.running.store(value, Ordering::Release);
    }

    pub(crate) fn set_paused(&self, value: bool) {
        self.paused.store(value, Ordering::Release);
    }

    pub(crate) fn store_position(&self, value: usize) {
        self.position.store(value, Ordering::Release);
    }
}

/// Thread-safe handle to [`PlaybackFlags`]. Cheap to clone.
pub type SharedFlags = Arc<PlaybackFlags>;

// ---------------------------------------------------------------------------
// PlaybackEvent
// ---------------------------------------------------------------------------

/// Progress events emitted by the playback thread, consumed by whatever
/// front end is observing the run.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Emitted immediately before a chunk is dispatched to the engine, so
    /// an observer can display the text before/while it plays.
    Speaking { text: String },

    /// Emitted after each successful dispatch. For a clean run over `total`
    /// chunks the sequence is `(1,total), (2,total), …, (total,total)`.
    Progress { position: usize, total: usize },

    /// The engine rejected a chunk; the run aborts after this event.
    Error { message: String },

    /// The run ended — completed, stopped, or aborted. Always the final
    /// event of a run.
    Finished,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
