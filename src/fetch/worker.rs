//! One-shot background fetch task.
//!
//! Wraps a [`TextFetcher`] call in a spawned tokio task and reports the
//! outcome over an mpsc channel, so the control thread stays responsive
//! while a page downloads. The task runs to completion or failure and is
//! never paused.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{Document, FetchError, TextFetcher};

/// Outcome of a background fetch.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    Completed { document: Document },
    Failed { message: String },
}

/// Spawn a one-shot fetch of `url`.
///
/// An empty (or whitespace-only) URL is a usage error rejected
/// synchronously, before any task starts. Otherwise exactly one
/// [`FetchEvent`] is delivered on `tx`.
pub fn spawn_fetch(
    fetcher: Arc<dyn TextFetcher>,
    url: String,
    tx: mpsc::Sender<FetchEvent>,
) -> Result<JoinHandle<()>, FetchError> {
    if url.trim().is_empty() {
        return Err(FetchError::EmptyUrl);
    }

    Ok(tokio::spawn(async move {
        let event = match fetcher.fetch(&url).await {
            Ok(document) => FetchEvent::Completed { document },
            Err(e) => {
                log::warn!("fetch: {url} failed: {e}");
                FetchEvent::Failed {
                    message: e.to_string(),
                }
            }
        };
        let _ = tx.send(event).await;
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
