//! Core data model for track resolution and clipping

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracksnip_common::time::{format_track_length, split_minutes};

/// One searchable result offered to the user for selection.
///
/// `reference_token` is already cache-indirected and safe to embed in a
/// size-constrained control payload; the full reference never leaves the
/// engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Track title as reported by the source
    pub title: String,
    /// Total track length in whole seconds
    pub duration_secs: u32,
    /// Short opaque token standing in for the full reference
    pub reference_token: String,
}

impl Candidate {
    /// Whole minutes of the track length.
    pub fn minutes(&self) -> u32 {
        split_minutes(self.duration_secs).0
    }

    /// Seconds remaining after the whole minutes.
    pub fn seconds(&self) -> u32 {
        split_minutes(self.duration_secs).1
    }

    /// Selection-button label: `"Title [3:24]"`.
    pub fn label(&self) -> String {
        format!("{} [{}]", self.title, format_track_length(self.duration_secs))
    }
}

/// First non-empty result set from exactly one source.
///
/// Ordering is the source's own relevance order, unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSet {
    pub candidates: Vec<Candidate>,
    pub source_alias: String,
}

/// Parameters for downloading one chosen candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionRequest {
    /// Alias of the source the candidate came from
    pub source_alias: String,
    /// Token to re-resolve into the full reference
    pub reference_token: String,
}

/// Requested `[start, end)` window within an acquired track, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipWindow {
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Clip window validation failure.
///
/// Violating windows are rejected, never clamped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("clip window end ({end_ms} ms) must be after start ({start_ms} ms)")]
    Inverted { start_ms: u64, end_ms: u64 },

    #[error("clip window is {len_ms} ms, minimum is {min_ms} ms")]
    TooShort { len_ms: u64, min_ms: u64 },
}

impl ClipWindow {
    /// Check ordering and the minimum-length policy.
    pub fn validate(&self, min_ms: u64) -> Result<(), WindowError> {
        if self.end_ms <= self.start_ms {
            return Err(WindowError::Inverted {
                start_ms: self.start_ms,
                end_ms: self.end_ms,
            });
        }
        let len_ms = self.end_ms - self.start_ms;
        if len_ms < min_ms {
            return Err(WindowError::TooShort { len_ms, min_ms });
        }
        Ok(())
    }

    /// Window length in milliseconds. Valid only after `validate`.
    pub fn length_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Window start in fractional seconds, as ffmpeg expects.
    pub fn start_secs(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    /// Window length in fractional seconds.
    pub fn length_secs(&self) -> f64 {
        self.length_ms() as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(duration_secs: u32) -> Candidate {
        Candidate {
            title: "Believer".to_string(),
            duration_secs,
            reference_token: "a1b2c3d4e5f60718".to_string(),
        }
    }

    #[test]
    fn test_candidate_minutes_seconds_invariant() {
        for duration in [0, 1, 59, 60, 61, 204, 3599, 3600, 7201] {
            let c = candidate(duration);
            assert_eq!(c.minutes() * 60 + c.seconds(), duration);
            assert!(c.seconds() < 60);
        }
    }

    #[test]
    fn test_candidate_label() {
        assert_eq!(candidate(204).label(), "Believer [3:24]");
        assert_eq!(candidate(65).label(), "Believer [1:05]");
    }

    #[test]
    fn test_window_accepts_minimum_length() {
        let window = ClipWindow {
            start_ms: 10_000,
            end_ms: 20_000,
        };
        assert_eq!(window.validate(10_000), Ok(()));
        assert_eq!(window.length_ms(), 10_000);
    }

    #[test]
    fn test_window_rejects_below_minimum() {
        let window = ClipWindow {
            start_ms: 5_000,
            end_ms: 8_000,
        };
        assert_eq!(
            window.validate(10_000),
            Err(WindowError::TooShort {
                len_ms: 3_000,
                min_ms: 10_000
            })
        );
    }

    #[test]
    fn test_window_rejects_inverted_and_empty() {
        let inverted = ClipWindow {
            start_ms: 9_000,
            end_ms: 4_000,
        };
        assert!(matches!(
            inverted.validate(10_000),
            Err(WindowError::Inverted { .. })
        ));

        let empty = ClipWindow {
            start_ms: 4_000,
            end_ms: 4_000,
        };
        assert!(matches!(
            empty.validate(10_000),
            Err(WindowError::Inverted { .. })
        ));
    }

    #[test]
    fn test_window_second_conversions() {
        let window = ClipWindow {
            start_ms: 10_500,
            end_ms: 40_000,
        };
        assert_eq!(window.start_secs(), 10.5);
        assert_eq!(window.length_secs(), 29.5);
    }
}
