//! The hub wires the session, pipeline, store, and digest provider
//! together and exposes the consumer-facing surface: start/stop recording
//! and the timeline, folder, record, and digest queries.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::adapters::{
    CaptureBackend, Classifier, DigestProvider, RecordStorage, Summarizer, Transcriber,
};
use crate::config::ResolvedConfig;
use crate::domain::{Category, DailyDigest, Record};
use crate::views::{ParaFolders, Timeline};

use super::pipeline::ProcessingPipeline;
use super::session::{SessionError, SessionManager};
use super::store::{KnowledgeStore, StoreError};

/// Everything the hub needs to talk to the outside world
pub struct Collaborators {
    pub capture: Arc<dyn CaptureBackend>,
    pub transcriber: Arc<dyn Transcriber>,
    pub summarizer: Arc<dyn Summarizer>,
    pub classifier: Arc<dyn Classifier>,
    pub storage: Arc<dyn RecordStorage>,
    pub digest: Arc<dyn DigestProvider>,
}

/// A record whose pipeline is still running after `stop_recording`.
///
/// Stopping always succeeds once capture completes; processing continues
/// in its own task. Await `wait` for the outcome, or query the store later.
pub struct PendingRecord {
    pub id: Uuid,
    pub duration_seconds: u64,
    handle: JoinHandle<Record>,
}

impl PendingRecord {
    /// Wait for the pipeline task to finish and return the final record
    pub async fn wait(self) -> Result<Record> {
        self.handle.await.context("Pipeline task panicked")
    }
}

/// Facade over the capture-to-knowledge pipeline
pub struct Hub {
    session: SessionManager,
    pipeline: Arc<ProcessingPipeline>,
    store: Arc<KnowledgeStore>,
    digest: Arc<dyn DigestProvider>,
}

impl Hub {
    /// Build a hub from collaborators, rebuilding the store from storage
    pub async fn open(config: &ResolvedConfig, collaborators: Collaborators) -> Result<Self> {
        let store = Arc::new(
            KnowledgeStore::load(collaborators.storage)
                .await
                .context("Failed to load record storage")?,
        );
        info!(records = store.len().await, "Knowledge store loaded");

        let pipeline = Arc::new(ProcessingPipeline::new(
            collaborators.transcriber,
            collaborators.summarizer,
            collaborators.classifier,
            store.clone(),
        ));

        let session = SessionManager::new(collaborators.capture, config.recordings_dir.clone());

        Ok(Self {
            session,
            pipeline,
            store,
            digest: collaborators.digest,
        })
    }

    /// Start a new capture session
    pub async fn start_recording(&self) -> Result<Uuid, SessionError> {
        self.session.start().await
    }

    /// Stop the active capture and submit one pipeline task for it.
    ///
    /// The seed record is upserted (and persisted) before this returns, so
    /// the capture is never lost even if the process exits before the
    /// pipeline task runs; an abandoned seed resumes via `reprocess`.
    /// Stage failures never surface here; they land on the record itself.
    pub async fn stop_recording(&self) -> Result<PendingRecord, SessionError> {
        let recording = self.session.stop().await?;

        let record = Record::from_recording(&recording);
        let id = record.id;
        let duration_seconds = record.duration_seconds;

        self.store.upsert(record.clone()).await;

        let pipeline = self.pipeline.clone();
        let store = self.store.clone();
        let handle = tokio::spawn(async move {
            match pipeline.resume(record.clone()).await {
                Ok(record) => record,
                // Claim rejection: another task already owns this id.
                // Report the store's current view of it instead.
                Err(e) => {
                    tracing::warn!(%id, error = %e, "Pipeline submission rejected");
                    store.get(id).await.unwrap_or(record)
                }
            }
        });

        Ok(PendingRecord {
            id,
            duration_seconds,
            handle,
        })
    }

    /// Elapsed time of the active capture; zero when idle
    pub async fn elapsed(&self) -> Duration {
        self.session.elapsed().await
    }

    /// Day-grouped, newest-first view of all records
    pub async fn timeline(&self) -> Timeline {
        Timeline::build(self.store.all().await)
    }

    /// Four-bucket PARA view of classified records
    pub async fn folders(&self) -> ParaFolders {
        ParaFolders::build(self.store.all().await)
    }

    /// Records in one bucket, newest-first
    pub async fn list_by_category(&self, category: Category) -> Vec<Record> {
        let folders = self.folders().await;
        folders.bucket(category).to_vec()
    }

    /// Fetch one record by id
    pub async fn record(&self, id: Uuid) -> Result<Record, StoreError> {
        self.store.get(id).await
    }

    /// Re-run the missing stages of a record (crash recovery, corrections)
    pub async fn reprocess(&self, id: Uuid) -> Result<Record> {
        let record = self.store.get(id).await?;
        let record = self.pipeline.resume(record).await?;
        Ok(record)
    }

    /// Date-scoped digest from the configured provider
    pub async fn digest(&self, date: NaiveDate) -> Result<DailyDigest> {
        self.digest.digest_for(date).await
    }

    /// Direct access to the store, for tests and presentation layers
    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.store
    }
}
