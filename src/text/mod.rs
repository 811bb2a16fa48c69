//! Text chunking for speech playback.
//!
//! Provides [`split_into_chunks`], the pure function that turns a fetched
//! narrative into the ordered chunk sequence the playback controller walks.

pub mod chunk;

pub use chunk::split_into_chunks;
