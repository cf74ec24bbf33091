//! Pinkamuz source adapter
//!
//! Scrapes the site's search page for track blocks and hands out direct
//! MP3 URLs (tokenized). First in the fallback order: when the site has
//! the track, the direct download is far cheaper than a yt-dlp run.

use crate::cache::ReferenceCache;
use crate::model::Candidate;
use crate::sources::{SourceAdapter, SourceError};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracksnip_common::EngineConfig;

const USER_AGENT: &str = "TrackSnip/0.1 (+https://github.com/tracksnip/tracksnip)";

/// One track block scraped from a search results page.
#[derive(Debug, PartialEq)]
struct ScrapedTrack {
    title: String,
    duration_secs: u32,
    mp3_url: String,
}

/// Extract the text between `start` and `end`, after `start`'s first
/// occurrence.
fn text_between<'a>(haystack: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = haystack.find(start)? + start.len();
    let len = haystack[from..].find(end)?;
    Some(&haystack[from..from + len])
}

/// Parse an `M:SS` (or `H:MM:SS`) track-length label into whole seconds.
fn parse_track_length(text: &str) -> u32 {
    text.trim()
        .split(':')
        .filter_map(|part| part.parse::<u32>().ok())
        .fold(0, |acc, part| acc * 60 + part)
}

/// Pull track blocks out of a search results page.
///
/// The markup per result is one `track__info` block carrying a
/// `track__title` text node, a `track__fulltime` length label, and a
/// `track__download-btn` anchor whose href is the direct MP3 URL. Blocks
/// missing any of the three are skipped.
fn parse_search_page(html: &str, max: usize) -> Vec<ScrapedTrack> {
    html.split("class=\"track__info\"")
        .skip(1)
        .filter_map(|block| {
            let title = text_between(block, "class=\"track__title\">", "<")?;
            let length = text_between(block, "class=\"track__fulltime\">", "<")?;
            let href = text_between(block, "class=\"track__download-btn\" href=\"", "\"")?;
            Some(ScrapedTrack {
                title: title.trim().to_string(),
                duration_secs: parse_track_length(length),
                mp3_url: href.to_string(),
            })
        })
        .take(max)
        .collect()
}

/// Pinkamuz adapter (`pin`), first in the fallback order.
pub struct PinkamuzSource {
    http: reqwest::Client,
    base_url: String,
    cache: Arc<ReferenceCache>,
}

impl PinkamuzSource {
    pub fn new(cache: Arc<ReferenceCache>, config: &EngineConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.pinkamuz_base_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    async fn fetch_search_page(&self, phrase: &str) -> Result<String, SourceError> {
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[("q", phrase)])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Network(format!(
                "search returned HTTP {}",
                response.status()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))
    }
}

#[async_trait]
impl SourceAdapter for PinkamuzSource {
    fn alias(&self) -> &'static str {
        "pin"
    }

    fn priority(&self) -> u8 {
        0
    }

    async fn search(
        &self,
        phrase: &str,
        scope_id: i64,
        max_results: usize,
    ) -> Result<Vec<Candidate>, SourceError> {
        let html = self.fetch_search_page(phrase).await?;
        let tracks = parse_search_page(&html, max_results);

        let mut candidates = Vec::with_capacity(tracks.len());
        for track in tracks {
            let token = self.cache.put(&track.mp3_url, scope_id).await;
            candidates.push(Candidate {
                title: track.title,
                duration_secs: track.duration_secs,
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
        tracing::debug!(source = self.alias(), dest = %dest.display(), "downloading direct MP3");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(url));
        }
        if !response.status().is_success() {
            return Err(SourceError::Network(format!(
                "download returned HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;
        if let Err(e) = tokio::fs::write(dest, &bytes).await {
            let _ = std::fs::remove_file(dest);
            return Err(SourceError::Io(e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"
        <ul class="tracks">
          <li><div class="track__info">
            <div class="track__title"> Imagine Dragons - Believer </div>
            <div class="track__fulltime">3:24</div>
            <a class="track__download-btn" href="https://cdn.pinkamuz.pro/dl/believer.mp3">dl</a>
          </div></li>
          <li><div class="track__info">
            <div class="track__title">Believer (Remix)</div>
            <div class="track__fulltime">4:01</div>
            <a class="track__download-btn" href="https://cdn.pinkamuz.pro/dl/believer_remix.mp3">dl</a>
          </div></li>
          <li><div class="track__info">
            <div class="track__title">Broken block, no download link</div>
            <div class="track__fulltime">2:10</div>
          </div></li>
        </ul>
    "#;

    #[test]
    fn test_parse_search_page() {
        let tracks = parse_search_page(SAMPLE_PAGE, 3);
        assert_eq!(tracks.len(), 2);
        assert_eq!(
            tracks[0],
            ScrapedTrack {
                title: "Imagine Dragons - Believer".to_string(),
                duration_secs: 204,
                mp3_url: "https://cdn.pinkamuz.pro/dl/believer.mp3".to_string(),
            }
        );
        assert_eq!(tracks[1].duration_secs, 241);
    }

    #[test]
    fn test_parse_search_page_respects_max() {
        assert_eq!(parse_search_page(SAMPLE_PAGE, 1).len(), 1);
    }

    #[test]
    fn test_parse_search_page_empty_is_no_results() {
        assert!(parse_search_page("<html><body>nothing here</body></html>", 3).is_empty());
    }

    #[test]
    fn test_parse_track_length() {
        assert_eq!(parse_track_length("3:24"), 204);
        assert_eq!(parse_track_length(" 0:59 "), 59);
        assert_eq!(parse_track_length("1:02:03"), 3723);
        assert_eq!(parse_track_length("garbage"), 0);
    }

    #[test]
    fn test_text_between() {
        assert_eq!(text_between("a[b]c", "[", "]"), Some("b"));
        assert_eq!(text_between("a[bc", "[", "]"), None);
        assert_eq!(text_between("abc", "[", "]"), None);
    }
}
