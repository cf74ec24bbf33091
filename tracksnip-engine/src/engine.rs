//! Acquisition engine
//!
//! Orchestrates the prioritized source registry: fallback search with
//! skip-ahead continuation, supervised acquisition of a chosen candidate,
//! and the supervised clip stage. The registry is sorted once at
//! construction and referenced read-only afterwards; per-call skip-ahead
//! only slices a view of it.

use crate::cache::ReferenceCache;
use crate::clipper::{ClipError, TrackClipper};
use crate::model::{AcquisitionRequest, CandidateSet, ClipWindow};
use crate::progress::run_with_progress;
use crate::sources::{SourceAdapter, SourceError};
use crate::transport::{StatusChannel, TransportError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use tracksnip_common::EngineConfig;
use uuid::Uuid;

const SEARCH_STATUS: &str = "🔎 Searching for the track… {spinner}\n(this can take a few seconds ⏳)";
const DOWNLOAD_STATUS: &str = "🛬 Downloading the track… {spinner}";
const CLIP_STATUS: &str = "✂️ Cutting and stitching… {spinner}";

/// Engine-level failure taxonomy.
///
/// Source exhaustion during search is not an error; `search` returns
/// `Ok(None)` and the caller presents a retry affordance.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Alias not present in the registry. Aliases originate from candidate
    /// sets this engine produced, so hitting this is a programming error.
    #[error("no source registered under alias '{0}'")]
    UnknownSource(String),

    /// One source's search failed; recovered by the fallback loop.
    #[error("search via '{alias}' failed: {source}")]
    Search {
        alias: &'static str,
        #[source]
        source: SourceError,
    },

    /// One source's search exceeded the per-source timeout.
    #[error("search via '{alias}' timed out")]
    SearchTimeout { alias: &'static str },

    /// Download of a chosen candidate failed; terminal for the request.
    #[error("acquisition via '{alias}' failed: {source}")]
    Acquisition {
        alias: String,
        #[source]
        source: SourceError,
    },

    /// Fragment stage failed (or the window was rejected).
    #[error("clip preparation failed: {0}")]
    Clip(#[from] ClipError),

    /// The status channel itself is broken.
    #[error("status channel failure: {0}")]
    Transport(#[from] TransportError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Track resolution & acquisition engine over a fixed source registry.
pub struct AcquisitionEngine {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    cache: Arc<ReferenceCache>,
    clipper: TrackClipper,
    config: EngineConfig,
}

impl AcquisitionEngine {
    /// Build the engine; the registry is priority-sorted here, once.
    /// Ties keep registration order.
    pub fn new(
        mut adapters: Vec<Arc<dyn SourceAdapter>>,
        cache: Arc<ReferenceCache>,
        config: EngineConfig,
    ) -> Self {
        adapters.sort_by_key(|adapter| adapter.priority());
        Self {
            adapters,
            cache,
            clipper: TrackClipper::new(&config),
            config,
        }
    }

    /// Registered aliases in fallback order (diagnostics, keyboards).
    pub fn aliases(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.alias()).collect()
    }

    /// Tokenize a full reference for embedding in a control payload.
    ///
    /// Used by callers that hand the engine a reference from outside a
    /// search (a pasted link, an attachment file id).
    pub async fn register_reference(&self, full_reference: &str, scope_id: i64) -> String {
        self.cache.put(full_reference, scope_id).await
    }

    fn adapter(&self, alias: &str) -> Result<&Arc<dyn SourceAdapter>, EngineError> {
        self.adapters
            .iter()
            .find(|adapter| adapter.alias() == alias)
            .ok_or_else(|| EngineError::UnknownSource(alias.to_string()))
    }

    /// Fallback search: try searchable sources in priority order, first
    /// non-empty result wins, no cross-source merging.
    ///
    /// `skip_past` drops every source up to and including that alias for
    /// this call only ("try the next source"). Per-source failures and
    /// timeouts are logged and skipped; `Ok(None)` means every source was
    /// exhausted.
    pub async fn search(
        &self,
        phrase: &str,
        scope_id: i64,
        skip_past: Option<&str>,
        channel: &dyn StatusChannel,
    ) -> Result<Option<CandidateSet>, EngineError> {
        let start = match skip_past {
            Some(alias) => {
                let position = self
                    .adapters
                    .iter()
                    .position(|adapter| adapter.alias() == alias)
                    .ok_or_else(|| EngineError::UnknownSource(alias.to_string()))?;
                position + 1
            }
            None => 0,
        };

        for adapter in &self.adapters[start..] {
            if !adapter.searchable() {
                continue;
            }
            debug!(source = adapter.alias(), phrase, "searching source");

            let supervised = {
                let adapter = Arc::clone(adapter);
                let phrase = phrase.to_string();
                let timeout = Duration::from_secs(self.config.search_timeout_secs);
                let max_results = self.config.max_search_results;
                async move {
                    let alias = adapter.alias();
                    match tokio::time::timeout(
                        timeout,
                        adapter.search(&phrase, scope_id, max_results),
                    )
                    .await
                    {
                        Ok(Ok(candidates)) => Ok(candidates),
                        Ok(Err(source)) => Err(EngineError::Search { alias, source }),
                        Err(_) => Err(EngineError::SearchTimeout { alias }),
                    }
                }
            };

            match run_with_progress(
                channel,
                scope_id,
                SEARCH_STATUS,
                self.progress_interval(),
                supervised,
            )
            .await
            {
                Ok(candidates) if !candidates.is_empty() => {
                    debug!(
                        source = adapter.alias(),
                        count = candidates.len(),
                        "source returned candidates"
                    );
                    return Ok(Some(CandidateSet {
                        candidates,
                        source_alias: adapter.alias().to_string(),
                    }));
                }
                Ok(_) => {
                    debug!(source = adapter.alias(), "source returned no candidates");
                }
                Err(EngineError::Transport(e)) => return Err(EngineError::Transport(e)),
                Err(e) => {
                    warn!(source = adapter.alias(), error = %e, "source unavailable, falling back");
                }
            }
        }
        Ok(None)
    }

    /// Download the chosen candidate to a fresh local temp file.
    ///
    /// Terminal on failure: candidates are not fungible across sources, so
    /// there is no automatic fallback once one was chosen.
    pub async fn acquire(
        &self,
        request: &AcquisitionRequest,
        scope_id: i64,
        channel: &dyn StatusChannel,
    ) -> Result<PathBuf, EngineError> {
        let adapter = Arc::clone(self.adapter(&request.source_alias)?);
        let dest = std::env::temp_dir().join(format!("tracksnip_{}.mp3", Uuid::new_v4()));
        debug!(
            source = request.source_alias,
            dest = %dest.display(),
            "acquiring chosen candidate"
        );

        let supervised = {
            let token = request.reference_token.clone();
            let alias = request.source_alias.clone();
            let dest = dest.clone();
            async move {
                adapter
                    .acquire(&token, scope_id, &dest)
                    .await
                    .map_err(|source| EngineError::Acquisition { alias, source })?;
                Ok(dest)
            }
        };

        run_with_progress(
            channel,
            scope_id,
            DOWNLOAD_STATUS,
            self.progress_interval(),
            supervised,
        )
        .await
    }

    /// Run the fragment stage over an acquired track.
    ///
    /// The window is rejected synchronously before the status message is
    /// sent or any media tooling runs.
    pub async fn clip(
        &self,
        source: &Path,
        window: ClipWindow,
        scope_id: i64,
        channel: &dyn StatusChannel,
    ) -> Result<PathBuf, EngineError> {
        window
            .validate(self.config.min_clip_len_ms)
            .map_err(ClipError::from)?;

        let supervised = {
            let clipper = self.clipper.clone();
            let source = source.to_path_buf();
            async move {
                clipper
                    .prepare_clip(&source, window)
                    .await
                    .map_err(EngineError::from)
            }
        };

        run_with_progress(
            channel,
            scope_id,
            CLIP_STATUS,
            self.progress_interval(),
            supervised,
        )
        .await
    }

    fn progress_interval(&self) -> Duration {
        tracksnip_common::time::millis_to_duration(self.config.progress_interval_ms)
    }
}
