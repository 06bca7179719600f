//! memoflow - voice capture filed into PARA
//!
//! Captures spoken audio, transcribes it, summarizes it, and files it into
//! the PARA taxonomy (Projects / Areas / Resources / Archives), with a
//! day-grouped timeline and per-bucket folder views over the results.
//!
//! # Architecture
//!
//! The system is built around a three-stage pipeline:
//! - A guarded session slot allows exactly one active recording
//! - Each stopped recording becomes one pipeline task: transcribe →
//!   summarize → classify, each stage gated on the previous
//! - Records are visible in the knowledge store from the moment they are
//!   seeded; a stage failure marks the record partially failed instead of
//!   dropping it
//! - Timeline and folder views are derived from the store on every read
//!
//! # Modules
//!
//! - `adapters`: External collaborator contracts and implementations
//!   (capture, whisper, fabric, storage, digest)
//! - `core`: Session, pipeline, store, and the Hub facade
//! - `domain`: Data structures (Recording, Record, Category, DailyDigest)
//! - `views`: Derived timeline and PARA folder views
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Capture and file a recording
//! memoflow record
//!
//! # Browse results
//! memoflow timeline
//! memoflow folders projects
//! memoflow show <record-id>
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod views;

// Re-export main types at crate root for convenience
pub use crate::core::{Collaborators, Hub, KnowledgeStore, PendingRecord, ProcessingPipeline};
pub use crate::core::{PipelineError, SessionError, SessionManager, StoreError};
pub use domain::{Category, DailyDigest, Record, Recording, RecordingStatus, Stage};
pub use views::{ParaFolders, Timeline, TimelineDay};
