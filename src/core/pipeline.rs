//! The processing pipeline: transcribe, summarize, classify.
//!
//! Each stage is gated on the previous one succeeding. A stage failure
//! marks the record `PartiallyFailed` at that stage and stops; later
//! stages are never attempted. The store is upserted after every
//! transition so partial progress is always visible to readers.
//!
//! Re-running a record is safe: a stage whose output is already present is
//! skipped, never re-applied.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{Classifier, Summarizer, Transcriber};
use crate::domain::{PipelineStage, Record, Recording, Stage};

use super::store::KnowledgeStore;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline already running for record {0}")]
    AlreadyRunning(Uuid),

    #[error("recording {0} has not been stopped")]
    NotStopped(Uuid),
}

/// Sequences the three collaborator calls for one record at a time per id.
/// Distinct records may be processed concurrently.
pub struct ProcessingPipeline {
    transcriber: Arc<dyn Transcriber>,
    summarizer: Arc<dyn Summarizer>,
    classifier: Arc<dyn Classifier>,
    store: Arc<KnowledgeStore>,
    // std Mutex: held only for set insert/remove, never across an await
    in_flight: Mutex<HashSet<Uuid>>,
}

impl ProcessingPipeline {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        summarizer: Arc<dyn Summarizer>,
        classifier: Arc<dyn Classifier>,
        store: Arc<KnowledgeStore>,
    ) -> Self {
        Self {
            transcriber,
            summarizer,
            classifier,
            store,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Process a stopped recording into a record.
    ///
    /// The record is visible in the store immediately, before any stage
    /// runs. Stage failures are recorded on the record, not returned as
    /// errors.
    #[instrument(skip(self, recording), fields(id = %recording.id))]
    pub async fn process(&self, recording: Recording) -> Result<Record, PipelineError> {
        if !recording.is_stopped() {
            return Err(PipelineError::NotStopped(recording.id));
        }

        let _guard = self.claim(recording.id)?;

        let record = Record::from_recording(&recording);
        self.store.upsert(record.clone()).await;

        Ok(self.run_stages(record).await)
    }

    /// Re-run the missing stages of an existing record.
    ///
    /// Filed records are returned unchanged. A partially failed record
    /// resumes at its first missing output; completed stages are skipped.
    #[instrument(skip(self, record), fields(id = %record.id))]
    pub async fn resume(&self, record: Record) -> Result<Record, PipelineError> {
        if record.stage == Stage::Filed {
            return Ok(record);
        }

        let _guard = self.claim(record.id)?;

        Ok(self.run_stages(record).await)
    }

    /// Reserve an id; the guard releases it on drop
    fn claim(&self, id: Uuid) -> Result<InFlightGuard<'_>, PipelineError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !in_flight.insert(id) {
            return Err(PipelineError::AlreadyRunning(id));
        }
        Ok(InFlightGuard { pipeline: self, id })
    }

    async fn run_stages(&self, mut record: Record) -> Record {
        let start = Instant::now();

        // Transcribe
        if record.transcript.is_none() {
            record.stage = Stage::Transcribing;
            self.store.upsert(record.clone()).await;

            match self.transcriber.transcribe(&record.audio_ref).await {
                Ok(text) => {
                    record.transcript = Some(text);
                }
                Err(e) => {
                    return self.halt(record, PipelineStage::Transcribing, e).await;
                }
            }
        }

        // The transcribe gate just ran; an empty transcript is still valid
        let transcript = record.transcript.clone().unwrap_or_default();

        if record.summary.is_none() {
            record.stage = Stage::Summarizing;
            self.store.upsert(record.clone()).await;

            match self.summarizer.summarize(&transcript).await {
                Ok(summary) => {
                    record.summary = Some(summary);
                }
                Err(e) => {
                    // Still filed under the timeline with the transcript as
                    // its display fallback; classification is skipped
                    return self.halt(record, PipelineStage::Summarizing, e).await;
                }
            }
        }

        // Classify
        if record.category.is_none() {
            record.stage = Stage::Classifying;
            self.store.upsert(record.clone()).await;

            match self
                .classifier
                .classify(&transcript, record.summary.as_deref())
                .await
            {
                Ok(category) => {
                    record.category = Some(category);
                }
                Err(e) => {
                    return self.halt(record, PipelineStage::Classifying, e).await;
                }
            }
        }

        record.stage = Stage::Filed;
        self.store.upsert(record.clone()).await;

        info!(
            id = %record.id,
            duration_ms = start.elapsed().as_millis() as u64,
            category = %record.category.map(|c| c.to_string()).unwrap_or_default(),
            "Record filed"
        );

        record
    }

    async fn halt(&self, mut record: Record, failed: PipelineStage, error: anyhow::Error) -> Record {
        warn!(id = %record.id, stage = %failed, error = %error, "Pipeline stage failed");

        record.stage = Stage::PartiallyFailed {
            failed,
            reason: error.to_string(),
        };
        self.store.upsert(record.clone()).await;

        record
    }
}

struct InFlightGuard<'a> {
    pipeline: &'a ProcessingPipeline,
    id: Uuid,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.pipeline
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.id);
    }
}
