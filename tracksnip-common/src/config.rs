//! Engine configuration loading
//!
//! Tunables are resolved in priority order:
//! 1. Environment variables (`TRACKSNIP_*`, highest priority)
//! 2. TOML config file
//! 3. Compiled defaults (fallback)
//!
//! There is no runtime reconfiguration path; configuration is read once at
//! process start and handed to the engine by value.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Engine tunables.
///
/// All durations are plain integers in the unit named by the field so the
/// TOML surface stays flat and greppable.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-source search timeout in seconds.
    pub search_timeout_secs: u64,
    /// Reference cache entry lifetime in seconds.
    pub cache_ttl_secs: u64,
    /// Status message edit cadence in milliseconds.
    pub progress_interval_ms: u64,
    /// Fade-out length in seconds, applied at the end of the final clip.
    pub fade_duration_secs: f64,
    /// Minimum accepted clip window length in milliseconds.
    pub min_clip_len_ms: u64,
    /// Maximum number of candidates requested from one source.
    pub max_search_results: usize,
    /// Path to the lead-in cue prepended to every delivered clip.
    pub lead_in_path: PathBuf,
    /// Base URL of the Pinkamuz search site.
    pub pinkamuz_base_url: String,
    /// yt-dlp binary name or path.
    pub ytdlp_binary: String,
    /// ffmpeg binary name or path.
    pub ffmpeg_binary: String,
    /// ffprobe binary name or path.
    pub ffprobe_binary: String,
    /// Output bitrate passed to the mp3 encoder.
    pub output_bitrate: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_timeout_secs: 30,
            cache_ttl_secs: 120,
            progress_interval_ms: 200,
            fade_duration_secs: 2.0,
            min_clip_len_ms: 10_000,
            max_search_results: 3,
            lead_in_path: PathBuf::from("assets/lead_in.mp3"),
            pinkamuz_base_url: "https://pinkamuz.pro".to_string(),
            ytdlp_binary: "yt-dlp".to_string(),
            ffmpeg_binary: "ffmpeg".to_string(),
            ffprobe_binary: "ffprobe".to_string(),
            output_bitrate: "192k".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration with the standard priority order.
    ///
    /// `file` overrides the platform default config location; pass `None`
    /// to look for `tracksnip/config.toml` under the user config directory.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => match default_config_file() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Apply `TRACKSNIP_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        override_parsed("TRACKSNIP_SEARCH_TIMEOUT_SECS", &mut self.search_timeout_secs);
        override_parsed("TRACKSNIP_CACHE_TTL_SECS", &mut self.cache_ttl_secs);
        override_parsed("TRACKSNIP_PROGRESS_INTERVAL_MS", &mut self.progress_interval_ms);
        override_parsed("TRACKSNIP_FADE_DURATION_SECS", &mut self.fade_duration_secs);
        override_parsed("TRACKSNIP_MIN_CLIP_LEN_MS", &mut self.min_clip_len_ms);
        override_parsed("TRACKSNIP_MAX_SEARCH_RESULTS", &mut self.max_search_results);
        if let Ok(value) = std::env::var("TRACKSNIP_LEAD_IN_PATH") {
            self.lead_in_path = PathBuf::from(value);
        }
        override_string("TRACKSNIP_PINKAMUZ_BASE_URL", &mut self.pinkamuz_base_url);
        override_string("TRACKSNIP_YTDLP_BINARY", &mut self.ytdlp_binary);
        override_string("TRACKSNIP_FFMPEG_BINARY", &mut self.ffmpeg_binary);
        override_string("TRACKSNIP_FFPROBE_BINARY", &mut self.ffprobe_binary);
        override_string("TRACKSNIP_OUTPUT_BITRATE", &mut self.output_bitrate);
    }
}

fn override_string(var: &str, target: &mut String) {
    if let Ok(value) = std::env::var(var) {
        *target = value;
    }
}

fn override_parsed<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(var, value, "ignoring unparseable override"),
        }
    }
}

/// Platform default config file path (`<config dir>/tracksnip/config.toml`).
fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tracksnip").join("config.toml"))
}
