//! Domain types for memoflow.
//!
//! This module contains the core data structures:
//! - Recording: lifecycle of a single capture session
//! - Record: the finalized knowledge artifact derived from a capture
//! - DailyDigest: date-scoped digest payload

pub mod digest;
pub mod record;
pub mod recording;

// Re-export commonly used types
pub use digest::{DailyDigest, Highlight};
pub use record::{Category, PipelineStage, Record, Stage};
pub use recording::{Recording, RecordingStatus};
