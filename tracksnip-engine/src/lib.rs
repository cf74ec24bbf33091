//! # TrackSnip Engine
//!
//! Track resolution & acquisition engine behind the music-clip bot:
//! - Fallback search across prioritized, independently failing sources
//! - Token indirection for size-constrained control payloads
//! - Supervised background acquisition with a live progress indicator
//! - Fragment extraction with lead-in cue and ending fade
//!
//! The messaging transport and conversational state machine are external
//! collaborators behind the traits in [`transport`].

pub mod cache;
pub mod clipper;
pub mod engine;
pub mod model;
pub mod progress;
pub mod sources;
pub mod transport;

pub use cache::ReferenceCache;
pub use clipper::{ClipError, TrackClipper};
pub use engine::{AcquisitionEngine, EngineError};
pub use model::{AcquisitionRequest, Candidate, CandidateSet, ClipWindow, WindowError};
pub use sources::{SourceAdapter, SourceError};
pub use transport::{AttachmentFetcher, MessageId, StatusChannel, TransportError};
