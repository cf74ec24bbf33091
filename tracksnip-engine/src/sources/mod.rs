//! Source adapters
//!
//! One adapter per audio backend, behind a uniform capability surface:
//! search a phrase into candidates, acquire a chosen reference into a local
//! file. Adapters tokenize every reference they hand out through the
//! [`ReferenceCache`](crate::cache::ReferenceCache) and resolve tokens back
//! when acquiring, so the engine never sees full references in control
//! payloads.
//!
//! Adding a backend means implementing [`SourceAdapter`] and registering it
//! with the engine; the fallback algorithm needs no change.

use crate::model::Candidate;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub mod attachment;
pub mod pinkamuz;
pub mod youtube;

pub use attachment::AttachmentSource;
pub use pinkamuz::PinkamuzSource;
pub use youtube::YoutubeSource;

/// Per-source failure, distinguishable so the engine can log the cause and
/// fall back. "No results" is never an error; adapters return an empty list.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("backend tool failure: {0}")]
    Tool(String),

    #[error("cannot parse backend response: {0}")]
    Parse(String),

    #[error("reference not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Uniform capability surface over one audio backend.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable short identifier, embedded in acquisition requests.
    fn alias(&self) -> &'static str;

    /// Fallback-search position; lower runs first, ties keep registration
    /// order.
    fn priority(&self) -> u8;

    /// Whether this source participates in fallback search. Acquire-only
    /// sources (user attachments) return false and stay addressable by
    /// alias.
    fn searchable(&self) -> bool {
        true
    }

    /// Search the backend for `phrase`.
    ///
    /// Returns an empty list for "no results"; `Err` only for transport or
    /// parse failures. Returned candidates carry cache tokens scoped to
    /// `scope_id`.
    async fn search(
        &self,
        phrase: &str,
        scope_id: i64,
        max_results: usize,
    ) -> Result<Vec<Candidate>, SourceError>;

    /// Resolve `reference_token` and download the audio to `dest`.
    ///
    /// Never leaves a partial file behind silently: any failure is a typed
    /// error.
    async fn acquire(
        &self,
        reference_token: &str,
        scope_id: i64,
        dest: &Path,
    ) -> Result<(), SourceError>;
}
