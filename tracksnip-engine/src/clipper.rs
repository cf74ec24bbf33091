//! Fragment extraction & concatenation stage
//!
//! Turns an acquired track plus a validated clip window into the final
//! deliverable: the trimmed fragment, the configured lead-in cue in front
//! of it, and a fade-out ending exactly at the end of the concatenated
//! stream. ffmpeg/ffprobe are treated as black boxes and run under
//! `spawn_blocking`.
//!
//! Only cut + prepend + fade are supported; this is not a general
//! transcoding pipeline.

use crate::model::{ClipWindow, WindowError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracksnip_common::EngineConfig;
use uuid::Uuid;

/// Fragment-stage failure. No partial output ever survives one of these.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("ffprobe failed: {0}")]
    Probe(String),

    #[error("ffmpeg failed: {0}")]
    Tool(String),

    #[error("cannot parse media duration: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// `ffprobe -of json -show_entries format=duration` output shape.
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn parse_probe_duration(json: &str) -> Result<f64, ClipError> {
    let probed: ProbeOutput =
        serde_json::from_str(json).map_err(|e| ClipError::Parse(e.to_string()))?;
    let duration = probed
        .format
        .duration
        .ok_or_else(|| ClipError::Parse("no format.duration in probe output".to_string()))?;
    duration
        .parse::<f64>()
        .map_err(|e| ClipError::Parse(format!("duration '{}': {}", duration, e)))
}

/// Fade start offset so the fade ends exactly at the end of a stream of
/// `total_secs`. Computed from the final concatenated duration; computing
/// it before concatenation would misplace the fade by the lead-in length.
pub fn fade_start_secs(total_secs: f64, fade_secs: f64) -> f64 {
    (total_secs - fade_secs).max(0.0)
}

/// Cut + prepend + fade over local media files.
#[derive(Debug, Clone)]
pub struct TrackClipper {
    ffmpeg: String,
    ffprobe: String,
    lead_in: PathBuf,
    fade_secs: f64,
    min_clip_len_ms: u64,
    bitrate: String,
}

impl TrackClipper {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_binary.clone(),
            ffprobe: config.ffprobe_binary.clone(),
            lead_in: config.lead_in_path.clone(),
            fade_secs: config.fade_duration_secs,
            min_clip_len_ms: config.min_clip_len_ms,
            bitrate: config.output_bitrate.clone(),
        }
    }

    /// Produce the final clip for `window` of `source`.
    ///
    /// The window is validated before any media tooling runs. The
    /// intermediate fragment file is removed on both paths; on failure the
    /// output file is removed as well.
    pub async fn prepare_clip(
        &self,
        source: &Path,
        window: ClipWindow,
    ) -> Result<PathBuf, ClipError> {
        window.validate(self.min_clip_len_ms)?;

        let fragment = self.cut_fragment(source, window).await?;
        let result = self.concat_with_lead_in(&fragment).await;
        let _ = std::fs::remove_file(&fragment);
        result
    }

    /// Extract `[start, end)` re-encoded to the canonical output codec.
    async fn cut_fragment(&self, source: &Path, window: ClipWindow) -> Result<PathBuf, ClipError> {
        let output = temp_mp3_path();
        tracing::debug!(
            source = %source.display(),
            start_secs = window.start_secs(),
            length_secs = window.length_secs(),
            "cutting fragment"
        );

        let mut command = Command::new(&self.ffmpeg);
        command
            .arg("-v")
            .arg("error")
            .arg("-y")
            .arg("-ss")
            .arg(format!("{:.3}", window.start_secs()))
            .arg("-t")
            .arg(format!("{:.3}", window.length_secs()))
            .arg("-i")
            .arg(source)
            .arg("-vn")
            .arg("-acodec")
            .arg("libmp3lame")
            .arg("-b:a")
            .arg(&self.bitrate)
            .arg(&output);

        if let Err(e) = run_media_tool(command).await {
            let _ = std::fs::remove_file(&output);
            return Err(e);
        }
        Ok(output)
    }

    /// Concatenate lead-in + fragment and fade the tail of the result.
    async fn concat_with_lead_in(&self, fragment: &Path) -> Result<PathBuf, ClipError> {
        let lead_in_secs = self.probe_duration(&self.lead_in).await?;
        let fragment_secs = self.probe_duration(fragment).await?;
        let fade_start = fade_start_secs(lead_in_secs + fragment_secs, self.fade_secs);

        let output = temp_mp3_path();
        let filter = format!(
            "[0:a][1:a]concat=n=2:v=0:a=1,afade=t=out:st={:.3}:d={:.3}",
            fade_start, self.fade_secs
        );

        let mut command = Command::new(&self.ffmpeg);
        command
            .arg("-v")
            .arg("error")
            .arg("-y")
            .arg("-i")
            .arg(&self.lead_in)
            .arg("-i")
            .arg(fragment)
            .arg("-filter_complex")
            .arg(&filter)
            .arg("-acodec")
            .arg("libmp3lame")
            .arg("-b:a")
            .arg(&self.bitrate)
            .arg(&output);

        if let Err(e) = run_media_tool(command).await {
            let _ = std::fs::remove_file(&output);
            return Err(e);
        }
        Ok(output)
    }

    /// Total duration of a media file in fractional seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64, ClipError> {
        let mut command = Command::new(&self.ffprobe);
        command
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("json")
            .arg(path);

        let output = tokio::task::spawn_blocking(move || command.output())
            .await
            .map_err(|e| ClipError::Probe(format!("task join error: {}", e)))?
            .map_err(|e| ClipError::Probe(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClipError::Probe(format!(
                "exit {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }
        parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

async fn run_media_tool(mut command: Command) -> Result<(), ClipError> {
    let output = tokio::task::spawn_blocking(move || command.output())
        .await
        .map_err(|e| ClipError::Tool(format!("task join error: {}", e)))?
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ClipError::Tool("ffmpeg binary not found in PATH".to_string())
            }
            _ => ClipError::Tool(e.to_string()),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ClipError::Tool(format!(
            "exit {:?}: {}",
            output.status.code(),
            stderr.trim()
        )));
    }
    Ok(())
}

fn temp_mp3_path() -> PathBuf {
    std::env::temp_dir().join(format!("tracksnip_{}.mp3", Uuid::new_v4()))
}
