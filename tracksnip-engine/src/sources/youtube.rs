//! YouTube source adapter
//!
//! Wraps the `yt-dlp` command-line tool: search uses `ytsearchN:` with
//! `--dump-json`, acquisition extracts bestaudio and re-encodes to mp3.
//! The binary runs under `spawn_blocking`; its stdout/stderr never reach
//! the user.

use crate::cache::ReferenceCache;
use crate::model::Candidate;
use crate::sources::{SourceAdapter, SourceError};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tracksnip_common::EngineConfig;

/// One `--dump-json` line of a yt-dlp search.
#[derive(Debug, Deserialize)]
struct YtEntry {
    title: Option<String>,
    /// Seconds; fractional for some livestream archives
    duration: Option<f64>,
    webpage_url: Option<String>,
    url: Option<String>,
}

impl YtEntry {
    fn reference(&self) -> Option<&str> {
        self.webpage_url.as_deref().or(self.url.as_deref())
    }
}

fn parse_search_output(stdout: &str) -> Result<Vec<YtEntry>, SourceError> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(|e| SourceError::Parse(e.to_string())))
        .collect()
}

/// YouTube adapter (`yt`), second in the fallback order.
pub struct YoutubeSource {
    binary: String,
    bitrate: String,
    cache: Arc<ReferenceCache>,
}

impl YoutubeSource {
    pub fn new(cache: Arc<ReferenceCache>, config: &EngineConfig) -> Self {
        Self {
            binary: config.ytdlp_binary.clone(),
            bitrate: config.output_bitrate.clone(),
            cache,
        }
    }

    async fn run_blocking(mut command: Command) -> Result<std::process::Output, SourceError> {
        tokio::task::spawn_blocking(move || command.output())
            .await
            .map_err(|e| SourceError::Tool(format!("task join error: {}", e)))?
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    SourceError::Tool("yt-dlp binary not found in PATH".to_string())
                }
                _ => SourceError::Tool(e.to_string()),
            })
    }
}

#[async_trait]
impl SourceAdapter for YoutubeSource {
    fn alias(&self) -> &'static str {
        "yt"
    }

    fn priority(&self) -> u8 {
        1
    }

    async fn search(
        &self,
        phrase: &str,
        scope_id: i64,
        max_results: usize,
    ) -> Result<Vec<Candidate>, SourceError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--dump-json")
            .arg("--no-download")
            .arg("--no-playlist")
            .arg(format!("ytsearch{}:{}", max_results, phrase));

        let output = Self::run_blocking(command).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::Tool(format!(
                "yt-dlp search exit {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let entries = parse_search_output(&stdout)?;

        let mut candidates = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(reference) = entry.reference() else {
                tracing::debug!(source = self.alias(), "skipping entry without reference");
                continue;
            };
            let token = self.cache.put(reference, scope_id).await;
            candidates.push(Candidate {
                title: entry.title.clone().unwrap_or_else(|| "Untitled".to_string()),
                duration_secs: entry.duration.unwrap_or(0.0).round() as u32,
                reference_token: token,
            });
        }
        Ok(candidates)
    }

    async fn acquire(
        &self,
        reference_token: &str,
        scope_id: i64,
        dest: &Path,
    ) -> Result<(), SourceError> {
        let url = self.cache.resolve(reference_token, scope_id).await;
        tracing::debug!(source = self.alias(), dest = %dest.display(), "downloading via yt-dlp");

        let mut command = Command::new(&self.binary);
        command
            .arg("--quiet")
            .arg("--no-playlist")
            .arg("-f")
            .arg("bestaudio/best")
            .arg("-x")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--audio-quality")
            .arg(&self.bitrate)
            .arg("-o")
            .arg(dest)
            .arg(&url);

        let output = Self::run_blocking(command).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let _ = std::fs::remove_file(dest);
            return Err(SourceError::Tool(format!(
                "yt-dlp download exit {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }
        if !dest.exists() {
            return Err(SourceError::NotFound(format!(
                "yt-dlp produced no file for {}",
                url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_output() {
        let stdout = concat!(
            r#"{"title": "Imagine Dragons - Believer", "duration": 204.0, "webpage_url": "https://www.youtube.com/watch?v=7wtfhZwyrcc"}"#,
            "\n",
            r#"{"title": "Believer (Lyrics)", "duration": 201.3, "url": "https://www.youtube.com/watch?v=Kx7B-XvmFtE"}"#,
            "\n",
        );

        let entries = parse_search_output(stdout).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title.as_deref(), Some("Imagine Dragons - Believer"));
        assert_eq!(
            entries[0].reference(),
            Some("https://www.youtube.com/watch?v=7wtfhZwyrcc")
        );
        // Falls back to `url` when webpage_url is absent
        assert_eq!(
            entries[1].reference(),
            Some("https://www.youtube.com/watch?v=Kx7B-XvmFtE")
        );
        assert_eq!(entries[1].duration, Some(201.3));
    }

    #[test]
    fn test_parse_search_output_empty_is_no_results() {
        assert!(parse_search_output("").unwrap().is_empty());
        assert!(parse_search_output("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_search_output_rejects_garbage() {
        let result = parse_search_output("ERROR: not json");
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }

    #[tokio::test]
    async fn test_search_tokenizes_references() {
        use std::time::Duration;

        let cache = Arc::new(ReferenceCache::new(Duration::from_secs(120)));
        let entry: YtEntry = serde_json::from_str(
            r#"{"title": "Believer", "duration": 204, "webpage_url": "https://www.youtube.com/watch?v=7wtfhZwyrcc"}"#,
        )
        .unwrap();

        let token = cache.put(entry.reference().unwrap(), 7).await;
        assert_eq!(token.len(), 16);
        assert_eq!(
            cache.resolve(&token, 7).await,
            "https://www.youtube.com/watch?v=7wtfhZwyrcc"
        );
    }
}
