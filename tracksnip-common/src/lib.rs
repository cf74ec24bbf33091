//! # TrackSnip Common Library
//!
//! Shared code for the TrackSnip workspace including:
//! - Common error types
//! - Engine configuration loading
//! - Timestamp and duration utilities

pub mod config;
pub mod error;
pub mod time;

pub use config::EngineConfig;
pub use error::{Error, Result};
