//! Sequential playback controller.
//!
//! [`PlaybackController`] walks a chunk sequence on a dedicated thread,
//! dispatching one synchronous [`SpeechEngine::speak`] call per chunk and
//! emitting [`PlaybackEvent`]s over an `std::sync::mpsc` channel.
//!
//! # State machine
//!
//! ```text
//! Idle ──start(chunks)──▶ Running ⇄ Paused
//!                            │
//!                            ├─ position == total ──▶ Finished
//!                            ├─ engine failure ─────▶ Aborted (Error event)
//!                            └─ stop() ─────────────▶ Aborted
//! ```
//!
//! Pausing is cooperative and polled: the loop re-checks the shared flags
//! every [`PAUSE_POLL_INTERVAL`] and never makes an external call while
//! paused. Stop is honoured at chunk granularity — a dispatch already sent
//! to the engine completes (or fails) before the loop observes the cleared
//! flag; there is no mid-utterance cancellation.
//!
//! Only one run may be active per controller. Starting a new run while one
//! is active stops the prior run and joins its thread before resetting
//! state, since the external engine is a single-channel resource.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;

use crate::engine::{SpeakRequest, SpeechEngine};

use super::state::{PlaybackEvent, PlaybackFlags, SharedFlags};

/// Worst-case latency for the loop to observe a resume or stop while
/// suspended.
pub const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Usage errors rejected synchronously, before any thread is spawned.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// `start` was called with an empty chunk sequence.
    #[error("nothing to read — fetch a text and split it into chunks first")]
    NoChunks,

    /// The OS refused to spawn the playback thread.
    #[error("failed to spawn playback thread: {0}")]
    Spawn(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// PlaybackController
// ---------------------------------------------------------------------------

/// Drives sequential chunk playback against a [`SpeechEngine`].
pub struct PlaybackController {
    engine: Arc<dyn SpeechEngine>,
    flags: SharedFlags,
    worker: Option<JoinHandle<()>>,
}

impl PlaybackController {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self {
            engine,
            flags: Arc::new(PlaybackFlags::new()),
            worker: None,
        }
    }

    /// Shared flags handle for observers (progress display, button state).
    pub fn flags(&self) -> SharedFlags {
        Arc::clone(&self.flags)
    }

    /// Whether a run is currently active (running, possibly paused).
    pub fn is_active(&self) -> bool {
        self.flags.is_running()
    }

    /// Start reading `chunks` aloud.
    ///
    /// `template` carries the voice channel and tuned parameter values; its
    /// `text` field is replaced per chunk. Events are delivered on `tx`.
    ///
    /// A still-active prior run is stopped and joined first. Rejects an
    /// empty `chunks` with [`PlaybackError::NoChunks`] without touching any
    /// state.
    pub fn start(
        &mut self,
        chunks: Vec<String>,
        template: SpeakRequest,
        tx: Sender<PlaybackEvent>,
    ) -> Result<(), PlaybackError> {
        if chunks.is_empty() {
            return Err(PlaybackError::NoChunks);
        }

        self.stop_and_wait();

        self.flags.store_position(0);
        self.flags.set_paused(false);
        self.flags.set_running(true);

        let engine = Arc::clone(&self.engine);
        let flags = Arc::clone(&self.flags);

        let worker = std::thread::Builder::new()
            .name("playback".into())
            .spawn(move || run_loop(engine, flags, chunks, template, tx))
            .map_err(|e| {
                self.flags.set_running(false);
                PlaybackError::Spawn(e)
            })?;

        self.worker = Some(worker);
        Ok(())
    }

    /// Suspend stepping before the next dispatch. No effect unless running.
    pub fn pause(&self) {
        if self.flags.is_running() {
            self.flags.set_paused(true);
        }
    }

    /// Resume a paused run. Observed within one poll interval.
    pub fn resume(&self) {
        self.flags.set_paused(false);
    }

    /// Request termination. The loop observes this at its next check; an
    /// in-flight utterance is allowed to complete. Does not roll back the
    /// position.
    pub fn stop(&self) {
        self.flags.set_running(false);
    }

    /// Stop and block until the playback thread has terminated.
    pub fn stop_and_wait(&mut self) {
        self.stop();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("playback: worker thread panicked");
            }
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.stop_and_wait();
    }
}

// ---------------------------------------------------------------------------
// Worker loop
// ---------------------------------------------------------------------------

fn run_loop(
    engine: Arc<dyn SpeechEngine>,
    flags: SharedFlags,
    chunks: Vec<String>,
    template: SpeakRequest,
    tx: Sender<PlaybackEvent>,
) {
    let total = chunks.len();
    log::info!("playback: starting run of {total} chunks");

    loop {
        let position = flags.position();
        if !flags.is_running() || position >= total {
            break;
        }

        // Cooperative suspension: purely local, no external call is made
        // while paused.
        if flags.is_paused() {
            std::thread::sleep(PAUSE_POLL_INTERVAL);
            continue;
        }

        let chunk = &chunks[position];
        let _ = tx.send(PlaybackEvent::Speaking {
            text: chunk.clone(),
        });

        let request = SpeakRequest {
            text: chunk.clone(),
            ..template.clone()
        };

        match engine.speak(&request) {
            Ok(()) => {
                flags.store_position(position + 1);
                let _ = tx.send(PlaybackEvent::Progress {
                    position: position + 1,
                    total,
                });
            }
            Err(e) => {
                log::error!("playback: engine failed on chunk {position}: {e}");
                let _ = tx.send(PlaybackEvent::Error {
                    message: e.to_string(),
                });
                break;
            }
        }
    }

    flags.set_running(false);
    let _ = tx.send(PlaybackEvent::Finished);
    log::info!(
        "playback: run ended at position {}/{total}",
        flags.position()
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use std::sync::mpsc;
    use std::time::Instant;

    const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

    fn chunks(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    /// Drain events until `Finished` arrives, failing the test if the run
    /// does not terminate within the timeout.
    fn drain_until_finished(rx: &mpsc::Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        let deadline = Instant::now() + EVENT_TIMEOUT;
        loop {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .expect("run did not finish in time");
            let event = rx.recv_timeout(remaining).expect("event channel closed");
            let finished = event == PlaybackEvent::Finished;
            events.push(event);
            if finished {
                return events;
            }
        }
    }

    fn progress_positions(events: &[PlaybackEvent]) -> Vec<usize> {
        events
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Progress { position, .. } => Some(*position),
                _ => None,
            })
            .collect()
    }

    // --- usage errors ---

    #[test]
    fn empty_chunks_are_rejected_synchronously() {
        let mut controller = PlaybackController::new(Arc::new(MockEngine::ok()));
        let (tx, rx) = mpsc::channel();

        let err = controller
            .start(Vec::new(), SpeakRequest::new(1, ""), tx)
            .unwrap_err();
        assert!(matches!(err, PlaybackError::NoChunks));
        assert!(!controller.is_active());
        // No thread was spawned, so no events were emitted.
        assert!(rx.try_recv().is_err());
    }

    // --- clean run ---

    #[test]
    fn clean_run_emits_monotonic_progress() {
        let engine = Arc::new(MockEngine::ok());
        let mut controller = PlaybackController::new(Arc::clone(&engine) as Arc<dyn SpeechEngine>);
        let (tx, rx) = mpsc::channel();

        controller
            .start(chunks(&["一", "二", "三"]), SpeakRequest::new(1, ""), tx)
            .unwrap();

        let events = drain_until_finished(&rx);
        assert_eq!(progress_positions(&events), vec![1, 2, 3]);
        assert!(events
            .iter()
            .all(|e| !matches!(e, PlaybackEvent::Error { .. })));

        assert_eq!(engine.spoken(), vec!["一", "二", "三"]);
        assert!(!controller.is_active());
        assert_eq!(controller.flags().position(), 3);
    }

    #[test]
    fn speaking_event_precedes_each_dispatch() {
        let engine = Arc::new(MockEngine::ok());
        let mut controller = PlaybackController::new(Arc::clone(&engine) as Arc<dyn SpeechEngine>);
        let (tx, rx) = mpsc::channel();

        controller
            .start(chunks(&["a", "b"]), SpeakRequest::new(1, ""), tx)
            .unwrap();

        let events = drain_until_finished(&rx);
        assert_eq!(
            events,
            vec![
                PlaybackEvent::Speaking { text: "a".into() },
                PlaybackEvent::Progress {
                    position: 1,
                    total: 2
                },
                PlaybackEvent::Speaking { text: "b".into() },
                PlaybackEvent::Progress {
                    position: 2,
                    total: 2
                },
                PlaybackEvent::Finished,
            ]
        );
    }

    // --- engine failure ---

    #[test]
    fn engine_failure_aborts_with_one_error_event() {
        let engine = Arc::new(MockEngine::failing_at(1));
        let mut controller = PlaybackController::new(Arc::clone(&engine) as Arc<dyn SpeechEngine>);
        let (tx, rx) = mpsc::channel();

        controller
            .start(chunks(&["a", "b", "c"]), SpeakRequest::new(1, ""), tx)
            .unwrap();

        let events = drain_until_finished(&rx);
        let errors = events
            .iter()
            .filter(|e| matches!(e, PlaybackEvent::Error { .. }))
            .count();
        assert_eq!(errors, 1);
        assert_eq!(progress_positions(&events), vec![1]);

        // Position stops at the failed chunk; the controller is restartable.
        assert_eq!(controller.flags().position(), 1);
        assert!(!controller.is_active());

        let (tx2, rx2) = mpsc::channel();
        let engine2 = Arc::new(MockEngine::ok());
        let mut controller2 =
            PlaybackController::new(Arc::clone(&engine2) as Arc<dyn SpeechEngine>);
        controller2
            .start(chunks(&["x"]), SpeakRequest::new(1, ""), tx2)
            .unwrap();
        let events2 = drain_until_finished(&rx2);
        assert_eq!(progress_positions(&events2), vec![1]);
    }

    // --- pause / resume ---

    #[test]
    fn pause_freezes_position_until_resume() {
        let engine = Arc::new(MockEngine::slow(Duration::from_millis(30)));
        let mut controller = PlaybackController::new(Arc::clone(&engine) as Arc<dyn SpeechEngine>);
        let (tx, rx) = mpsc::channel();

        controller
            .start(
                chunks(&["a", "b", "c", "d", "e"]),
                SpeakRequest::new(1, ""),
                tx,
            )
            .unwrap();

        // Pause as early as possible: at most the in-flight chunk completes.
        controller.pause();
        std::thread::sleep(Duration::from_millis(400));

        let frozen = controller.flags().position();
        assert!(
            frozen <= 1,
            "paused run advanced to position {frozen}"
        );

        // Still paused: no further progress accumulates.
        std::thread::sleep(Duration::from_millis(300));
        assert_eq!(controller.flags().position(), frozen);
        assert!(controller.is_active());

        controller.resume();
        let events = drain_until_finished(&rx);
        assert_eq!(
            progress_positions(&events).last().copied(),
            Some(5),
            "run must complete after resume"
        );
        assert_eq!(engine.spoken().len(), 5);
    }

    #[test]
    fn pause_has_no_effect_when_idle() {
        let controller = PlaybackController::new(Arc::new(MockEngine::ok()));
        controller.pause();
        assert!(!controller.flags().is_paused());
    }

    // --- stop ---

    #[test]
    fn stop_terminates_after_at_most_one_inflight_call() {
        let engine = Arc::new(MockEngine::slow(Duration::from_millis(30)));
        let mut controller = PlaybackController::new(Arc::clone(&engine) as Arc<dyn SpeechEngine>);
        let (tx, rx) = mpsc::channel();

        controller
            .start(
                chunks(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]),
                SpeakRequest::new(1, ""),
                tx,
            )
            .unwrap();

        // Wait for the first chunk to complete, then stop.
        let first = rx.recv_timeout(EVENT_TIMEOUT).unwrap();
        assert!(matches!(first, PlaybackEvent::Speaking { .. }));
        controller.stop();

        let events = drain_until_finished(&rx);
        // At most the in-flight dispatch (and one more already begun before
        // the flag was observed) completes; nowhere near all ten.
        let completed = progress_positions(&events).len();
        assert!(
            completed <= 2,
            "stop allowed {completed} dispatches to complete"
        );
        assert!(!controller.is_active());
    }

    #[test]
    fn stop_does_not_roll_back_position() {
        let engine = Arc::new(MockEngine::ok());
        let mut controller = PlaybackController::new(Arc::clone(&engine) as Arc<dyn SpeechEngine>);
        let (tx, rx) = mpsc::channel();

        controller
            .start(chunks(&["a", "b"]), SpeakRequest::new(1, ""), tx)
            .unwrap();
        drain_until_finished(&rx);

        let completed = controller.flags().position();
        controller.stop();
        assert_eq!(controller.flags().position(), completed);
    }

    // --- restart semantics ---

    #[test]
    fn restart_stops_prior_run_and_resets_position() {
        let engine = Arc::new(MockEngine::slow(Duration::from_millis(20)));
        let mut controller = PlaybackController::new(Arc::clone(&engine) as Arc<dyn SpeechEngine>);

        let (tx_a, rx_a) = mpsc::channel();
        controller
            .start(
                chunks(&["a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8"]),
                SpeakRequest::new(1, ""),
                tx_a,
            )
            .unwrap();

        // Second start while the first run is still active: the controller
        // must join the prior thread before resetting state.
        let (tx_b, rx_b) = mpsc::channel();
        controller
            .start(chunks(&["b1", "b2"]), SpeakRequest::new(1, ""), tx_b)
            .unwrap();

        // Run A ended with a Finished event before B began.
        let events_a = drain_until_finished(&rx_a);
        assert_eq!(events_a.last(), Some(&PlaybackEvent::Finished));

        let events_b = drain_until_finished(&rx_b);
        assert_eq!(progress_positions(&events_b), vec![1, 2]);
        assert_eq!(controller.flags().position(), 2);

        // No interleaving: every A utterance was dispatched before any B
        // utterance (single-channel engine invariant).
        let spoken = engine.spoken();
        let first_b = spoken.iter().position(|t| t.starts_with('b')).unwrap();
        assert!(spoken[first_b..].iter().all(|t| t.starts_with('b')));
    }

    #[test]
    fn template_parameters_flow_into_each_dispatch() {
        // The template's channel and tuned values apply to every chunk; only
        // the text varies.
        struct CapturingEngine(std::sync::Mutex<Vec<SpeakRequest>>);
        impl SpeechEngine for CapturingEngine {
            fn speak(&self, request: &SpeakRequest) -> Result<(), crate::engine::EngineError> {
                self.0.lock().unwrap().push(request.clone());
                Ok(())
            }
        }

        let engine = Arc::new(CapturingEngine(std::sync::Mutex::new(Vec::new())));
        let mut controller = PlaybackController::new(Arc::clone(&engine) as Arc<dyn SpeechEngine>);
        let (tx, rx) = mpsc::channel();

        let mut template = SpeakRequest::new(5102, "");
        template.effects.push(("speed".into(), 1.5));
        template.emotions.push(("喜び".into(), 0.4));

        controller
            .start(chunks(&["x", "y"]), template, tx)
            .unwrap();
        drain_until_finished(&rx);

        let requests = engine.0.lock().unwrap();
        assert_eq!(requests.len(), 2);
        for request in requests.iter() {
            assert_eq!(request.channel_id, 5102);
            assert_eq!(request.effects, vec![("speed".to_string(), 1.5)]);
            assert_eq!(request.emotions, vec![("喜び".to_string(), 0.4)]);
        }
        assert_eq!(requests[0].text, "x");
        assert_eq!(requests[1].text, "y");
    }
}
