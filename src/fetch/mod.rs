//! Source text acquisition.
//!
//! A narrative comes from one of two places: an Aozora Bunko work page
//! (fetched over HTTP and extracted from its HTML) or a local UTF-8 text
//! file. Both yield a [`Document`] — body text plus best-effort title and
//! author.
//!
//! The network path runs as a one-shot background task
//! ([`worker::spawn_fetch`]) so the control thread is never blocked on I/O.

pub mod aozora;
pub mod local;
pub mod worker;

use async_trait::async_trait;
use thiserror::Error;

pub use aozora::AozoraFetcher;
pub use local::read_local_document;
pub use worker::{spawn_fetch, FetchEvent};

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A fetched narrative, ready for chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub title: String,
    pub author: String,
}

// ---------------------------------------------------------------------------
// FetchError
// ---------------------------------------------------------------------------

/// All errors that can arise while acquiring source text.
///
/// None of these are fatal: the caller surfaces a message and the user can
/// retry with a corrected URL or path.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connection, TLS, HTTP status, decoding).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The page was fetched but carries no main-text container. Title and
    /// author are still extracted on a best-effort basis.
    #[error("no main text found in the document ({title} / {author})")]
    MissingBody { title: String, author: String },

    /// Local file could not be read.
    #[error("failed to read local file: {0}")]
    Io(#[from] std::io::Error),

    /// An empty URL was submitted — rejected before any task starts.
    #[error("no URL given")]
    EmptyUrl,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Http(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// TextFetcher trait
// ---------------------------------------------------------------------------

/// Async interface for remote document acquisition.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn TextFetcher>` with the background fetch task.
#[async_trait]
pub trait TextFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError>;
}
