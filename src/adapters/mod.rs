//! Collaborator contracts and their concrete implementations.
//!
//! Every external system memoflow depends on sits behind one of these
//! traits: the capture device, the speech-to-text engine, the
//! summarization/classification model, record persistence, and the digest
//! provider. The core never calls a subprocess or touches the filesystem
//! for these concerns directly.

pub mod capture;
pub mod digest;
pub mod fabric;
pub mod storage;
pub mod whisper;

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Category, DailyDigest, Record};

// Re-export the concrete adapters
pub use capture::FfmpegCapture;
pub use digest::PlaceholderDigest;
pub use fabric::FabricBackend;
pub use storage::JsonStorage;
pub use whisper::WhisperTranscriber;

/// Handle to an in-progress capture, returned by `CaptureBackend::start`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureHandle(pub u64);

/// Result of a completed capture
#[derive(Debug, Clone)]
pub struct CapturedAudio {
    /// Where the audio was written
    pub audio_path: PathBuf,

    /// Measured duration in seconds (0 if the backend cannot measure)
    pub duration_seconds: u64,
}

/// Audio capture device
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Begin writing audio to `output`. Fails if the device is unavailable.
    async fn start(&self, output: &Path) -> Result<CaptureHandle>;

    /// Stop the capture and finalize the audio file
    async fn stop(&self, handle: CaptureHandle) -> Result<CapturedAudio>;
}

/// Speech-to-text engine
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the referenced audio. An empty string is a valid result.
    async fn transcribe(&self, audio: &Path) -> Result<String>;
}

/// Transcript summarization model
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &str) -> Result<String>;
}

/// PARA classification model
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify into one of the four buckets; summary may be absent
    async fn classify(&self, transcript: &str, summary: Option<&str>) -> Result<Category>;
}

/// Durable record storage
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Load the full record set at startup
    async fn load(&self) -> Result<Vec<Record>>;

    /// Persist one record (insert or replace by id)
    async fn persist(&self, record: &Record) -> Result<()>;
}

/// Date-scoped digest provider.
///
/// Requests are idempotent: the same date yields the same digest, absent
/// new records for that date.
#[async_trait]
pub trait DigestProvider: Send + Sync {
    async fn digest_for(&self, date: NaiveDate) -> Result<DailyDigest>;
}
