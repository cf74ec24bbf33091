//! Chat-attachment source adapter
//!
//! Acquire-only: models audio the user sent as a message attachment.
//! Excluded from fallback search, but addressable by alias so a chosen
//! attachment flows through the same acquisition path as a searched
//! candidate. References are transport file ids, natively short, so the
//! cache's fallback-to-input resolution lets them pass through even when
//! they were never tokenized.

use crate::cache::ReferenceCache;
use crate::model::Candidate;
use crate::sources::{SourceAdapter, SourceError};
use crate::transport::AttachmentFetcher;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Attachment adapter (`tg`), last in the fallback order and skipped by it.
pub struct AttachmentSource {
    fetcher: Arc<dyn AttachmentFetcher>,
    cache: Arc<ReferenceCache>,
}

impl AttachmentSource {
    pub fn new(fetcher: Arc<dyn AttachmentFetcher>, cache: Arc<ReferenceCache>) -> Self {
        Self { fetcher, cache }
    }
}

#[async_trait]
impl SourceAdapter for AttachmentSource {
    fn alias(&self) -> &'static str {
        "tg"
    }

    fn priority(&self) -> u8 {
        2
    }

    fn searchable(&self) -> bool {
        false
    }

    async fn search(
        &self,
        _phrase: &str,
        _scope_id: i64,
        _max_results: usize,
    ) -> Result<Vec<Candidate>, SourceError> {
        // Attachments cannot be searched; uniform "no results"
        Ok(Vec::new())
    }

    async fn acquire(
        &self,
        reference_token: &str,
        scope_id: i64,
        dest: &Path,
    ) -> Result<(), SourceError> {
        let file_ref = self.cache.resolve(reference_token, scope_id).await;
        tracing::debug!(source = self.alias(), dest = %dest.display(), "fetching attachment");

        if let Err(e) = self.fetcher.fetch(&file_ref, dest).await {
            let _ = std::fs::remove_file(dest);
            return Err(SourceError::Network(e.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use std::time::Duration;

    struct StubFetcher;

    #[async_trait]
    impl AttachmentFetcher for StubFetcher {
        async fn fetch(&self, file_ref: &str, dest: &Path) -> Result<(), TransportError> {
            std::fs::write(dest, file_ref).map_err(|e| TransportError(e.to_string()))
        }
    }

    fn source() -> AttachmentSource {
        AttachmentSource::new(
            Arc::new(StubFetcher),
            Arc::new(ReferenceCache::new(Duration::from_secs(120))),
        )
    }

    #[tokio::test]
    async fn test_search_always_empty() {
        let results = source().search("believer", 7, 3).await.unwrap();
        assert!(results.is_empty());
        assert!(!source().searchable());
    }

    #[tokio::test]
    async fn test_acquire_passes_native_file_id_through() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("attachment.mp3");

        // Never cached: the raw file id reaches the fetcher unchanged
        source().acquire("BAADAgAD6QADBREAAUE", 7, &dest).await.unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "BAADAgAD6QADBREAAUE");
    }
}
