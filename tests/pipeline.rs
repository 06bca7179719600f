//! Pipeline stage-sequencing tests.
//!
//! Stages run in order, gate on the previous stage succeeding, halt at the
//! first failure, and never re-apply an output that already exists.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::Notify;
use uuid::Uuid;

use memoflow::adapters::{Classifier, RecordStorage, Summarizer, Transcriber};
use memoflow::core::{KnowledgeStore, PipelineError, ProcessingPipeline};
use memoflow::domain::{Category, PipelineStage, Record, Recording, RecordingStatus, Stage};
use memoflow::views::{ParaFolders, Timeline};

/// Transcriber double: fixed response, call counter, optional gate that
/// blocks each call until released
struct StubTranscriber {
    text: Option<String>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl StubTranscriber {
    fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            text: None,
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    fn gated(text: &str, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
            gate: Some(gate),
        })
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, _audio: &std::path::Path) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.text {
            Some(text) => Ok(text.clone()),
            None => anyhow::bail!("speech engine offline"),
        }
    }
}

struct StubSummarizer {
    text: Option<String>,
    calls: AtomicUsize,
}

impl StubSummarizer {
    fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            text: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, _transcript: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.text {
            Some(text) => Ok(text.clone()),
            None => anyhow::bail!("model timeout"),
        }
    }
}

struct StubClassifier {
    category: Option<Category>,
    calls: AtomicUsize,
}

impl StubClassifier {
    fn ok(category: Category) -> Arc<Self> {
        Arc::new(Self {
            category: Some(category),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            category: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(&self, _transcript: &str, _summary: Option<&str>) -> Result<Category> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.category {
            Some(category) => Ok(category),
            None => anyhow::bail!("no bucket named"),
        }
    }
}

/// In-memory storage double
#[derive(Default)]
struct MemoryStorage {
    records: tokio::sync::Mutex<Vec<Record>>,
}

#[async_trait]
impl RecordStorage for MemoryStorage {
    async fn load(&self) -> Result<Vec<Record>> {
        Ok(self.records.lock().await.clone())
    }

    async fn persist(&self, record: &Record) -> Result<()> {
        let mut records = self.records.lock().await;
        if let Some(existing) = records.iter_mut().find(|r| r.id == record.id) {
            *existing = record.clone();
        } else {
            records.push(record.clone());
        }
        Ok(())
    }
}

/// Storage double whose persist always fails
struct BrokenStorage;

#[async_trait]
impl RecordStorage for BrokenStorage {
    async fn load(&self) -> Result<Vec<Record>> {
        Ok(Vec::new())
    }

    async fn persist(&self, _record: &Record) -> Result<()> {
        anyhow::bail!("disk full")
    }
}

fn stopped_recording_at(stopped_at: DateTime<Utc>, duration_seconds: u64) -> Recording {
    Recording {
        id: Uuid::new_v4(),
        status: RecordingStatus::Stopped,
        started_at: stopped_at - ChronoDuration::seconds(duration_seconds as i64),
        stopped_at: Some(stopped_at),
        audio_ref: Some(PathBuf::from("/tmp/audio.wav")),
        duration_seconds,
    }
}

fn stopped_recording() -> Recording {
    stopped_recording_at(Utc::now(), 42)
}

fn pipeline_with(
    transcriber: Arc<StubTranscriber>,
    summarizer: Arc<StubSummarizer>,
    classifier: Arc<StubClassifier>,
) -> (Arc<ProcessingPipeline>, Arc<KnowledgeStore>) {
    let store = Arc::new(KnowledgeStore::new(Arc::new(MemoryStorage::default())));
    let pipeline = Arc::new(ProcessingPipeline::new(
        transcriber,
        summarizer,
        classifier,
        store.clone(),
    ));
    (pipeline, store)
}

#[tokio::test]
async fn test_full_success_is_filed() {
    let (pipeline, store) = pipeline_with(
        StubTranscriber::ok("hello world"),
        StubSummarizer::ok("Greeting"),
        StubClassifier::ok(Category::Resources),
    );

    let recording = stopped_recording();
    let record = pipeline.process(recording.clone()).await.unwrap();

    assert_eq!(record.stage, Stage::Filed);
    assert_eq!(record.transcript.as_deref(), Some("hello world"));
    assert_eq!(record.summary.as_deref(), Some("Greeting"));
    assert_eq!(record.category, Some(Category::Resources));

    // Round-trip: the store returns the identical value
    let fetched = store.get(recording.id).await.unwrap();
    assert_eq!(fetched, record);
}

#[tokio::test]
async fn test_scenario_a_summarization_failure() {
    // Stop at T0+42s, transcription succeeds, summarization fails
    let classifier = StubClassifier::ok(Category::Projects);
    let (pipeline, store) = pipeline_with(
        StubTranscriber::ok("hello world"),
        StubSummarizer::failing(),
        classifier.clone(),
    );

    let recording = stopped_recording();
    assert_eq!(recording.duration_seconds, 42);

    let record = pipeline.process(recording).await.unwrap();

    assert_eq!(
        record.stage,
        Stage::PartiallyFailed {
            failed: PipelineStage::Summarizing,
            reason: "model timeout".to_string(),
        }
    );
    assert_eq!(record.transcript.as_deref(), Some("hello world"));
    assert!(record.summary.is_none());
    assert!(record.category.is_none());

    // Classification was never attempted after the failure
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);

    // Still in the timeline, in no taxonomy bucket
    let timeline = Timeline::build(store.all().await);
    assert_eq!(timeline.len(), 1);
    let folders = ParaFolders::build(store.all().await);
    assert!(folders.is_empty());
}

#[tokio::test]
async fn test_transcription_failure_halts_pipeline() {
    let summarizer = StubSummarizer::ok("unused");
    let (pipeline, store) = pipeline_with(
        StubTranscriber::failing(),
        summarizer.clone(),
        StubClassifier::ok(Category::Areas),
    );

    let record = pipeline.process(stopped_recording()).await.unwrap();

    assert_eq!(
        record.stage,
        Stage::PartiallyFailed {
            failed: PipelineStage::Transcribing,
            reason: "speech engine offline".to_string(),
        }
    );
    assert!(record.transcript.is_none());
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);

    // Never dropped: the record is visible with its failure recorded
    assert!(store.get(record.id).await.is_ok());
}

#[tokio::test]
async fn test_classification_failure_still_in_timeline() {
    let (pipeline, store) = pipeline_with(
        StubTranscriber::ok("standup notes"),
        StubSummarizer::ok("Standup"),
        StubClassifier::failing(),
    );

    let record = pipeline.process(stopped_recording()).await.unwrap();

    assert!(matches!(
        record.stage,
        Stage::PartiallyFailed {
            failed: PipelineStage::Classifying,
            ..
        }
    ));
    assert_eq!(record.summary.as_deref(), Some("Standup"));
    assert!(record.category.is_none());

    let timeline = Timeline::build(store.all().await);
    assert_eq!(timeline.len(), 1);
    assert!(ParaFolders::build(store.all().await).is_empty());
}

#[tokio::test]
async fn test_record_visible_before_completion() {
    let gate = Arc::new(Notify::new());
    let (pipeline, store) = pipeline_with(
        StubTranscriber::gated("slow transcript", gate.clone()),
        StubSummarizer::ok("Summary"),
        StubClassifier::ok(Category::Archives),
    );

    let recording = stopped_recording();
    let id = recording.id;

    let task = tokio::spawn(async move { pipeline.process(recording).await });

    // Wait until the pipeline has seeded the record
    let mut seeded = None;
    for _ in 0..100 {
        if let Ok(record) = store.get(id).await {
            seeded = Some(record);
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let seeded = seeded.expect("record was not visible while processing");
    assert_eq!(seeded.stage, Stage::Transcribing);
    assert!(seeded.transcript.is_none());

    gate.notify_one();
    let record = task.await.unwrap().unwrap();
    assert_eq!(record.stage, Stage::Filed);
}

#[tokio::test]
async fn test_resume_skips_completed_stages() {
    let transcriber = StubTranscriber::ok("should not be called");
    let (pipeline, store) = pipeline_with(
        transcriber.clone(),
        StubSummarizer::ok("Recovered summary"),
        StubClassifier::ok(Category::Projects),
    );

    // A record that previously failed during summarization
    let recording = stopped_recording();
    let mut stalled = Record::from_recording(&recording);
    stalled.transcript = Some("existing transcript".to_string());
    stalled.stage = Stage::PartiallyFailed {
        failed: PipelineStage::Summarizing,
        reason: "model timeout".to_string(),
    };
    store.upsert(stalled.clone()).await;

    let resumed = pipeline.resume(stalled).await.unwrap();

    assert_eq!(resumed.stage, Stage::Filed);
    // Transcription was skipped, its output untouched
    assert_eq!(resumed.transcript.as_deref(), Some("existing transcript"));
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
    assert_eq!(resumed.summary.as_deref(), Some("Recovered summary"));
    assert_eq!(resumed.category, Some(Category::Projects));
}

#[tokio::test]
async fn test_resume_filed_record_is_noop() {
    let summarizer = StubSummarizer::ok("unused");
    let (pipeline, _store) = pipeline_with(
        StubTranscriber::ok("unused"),
        summarizer.clone(),
        StubClassifier::ok(Category::Areas),
    );

    let recording = stopped_recording();
    let mut filed = Record::from_recording(&recording);
    filed.transcript = Some("done".to_string());
    filed.summary = Some("Done".to_string());
    filed.category = Some(Category::Areas);
    filed.stage = Stage::Filed;

    let resumed = pipeline.resume(filed.clone()).await.unwrap();

    assert_eq!(resumed, filed);
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_duplicate_in_flight_rejected() {
    let gate = Arc::new(Notify::new());
    let (pipeline, store) = pipeline_with(
        StubTranscriber::gated("slow", gate.clone()),
        StubSummarizer::ok("Summary"),
        StubClassifier::ok(Category::Projects),
    );

    let recording = stopped_recording();
    let duplicate = recording.clone();
    let id = recording.id;

    let first = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.process(recording).await })
    };

    // Give the first task time to claim the id
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let second = pipeline.process(duplicate).await;
    assert!(matches!(second, Err(PipelineError::AlreadyRunning(d)) if d == id));

    gate.notify_one();
    assert!(first.await.unwrap().is_ok());

    // After completion the id is released: a new claim is accepted
    let mut stalled = store.get(id).await.unwrap();
    stalled.category = None;
    stalled.stage = Stage::PartiallyFailed {
        failed: PipelineStage::Classifying,
        reason: "interrupted".to_string(),
    };
    let resumed = pipeline.resume(stalled).await.unwrap();
    assert_eq!(resumed.stage, Stage::Filed);
}

#[tokio::test]
async fn test_unstopped_recording_rejected() {
    let (pipeline, store) = pipeline_with(
        StubTranscriber::ok("text"),
        StubSummarizer::ok("Summary"),
        StubClassifier::ok(Category::Projects),
    );

    let mut recording = stopped_recording();
    recording.status = RecordingStatus::Recording;
    let id = recording.id;

    let result = pipeline.process(recording).await;
    assert!(matches!(result, Err(PipelineError::NotStopped(r)) if r == id));
    assert!(store.get(id).await.is_err());
}

#[tokio::test]
async fn test_scenario_b_completion_order_does_not_affect_timeline() {
    // R1 stopped before R2, but R1's pipeline finishes last
    let now = Utc::now();
    let r1 = stopped_recording_at(now - ChronoDuration::seconds(60), 10);
    let r2 = stopped_recording_at(now, 10);

    let gate = Arc::new(Notify::new());
    let store = Arc::new(KnowledgeStore::new(Arc::new(MemoryStorage::default())));

    let slow_pipeline = Arc::new(ProcessingPipeline::new(
        StubTranscriber::gated("first recording", gate.clone()),
        StubSummarizer::ok("First"),
        StubClassifier::ok(Category::Projects),
        store.clone(),
    ));
    let fast_pipeline = Arc::new(ProcessingPipeline::new(
        StubTranscriber::ok("second recording"),
        StubSummarizer::ok("Second"),
        StubClassifier::ok(Category::Projects),
        store.clone(),
    ));

    let r1_id = r1.id;
    let r2_id = r2.id;

    let slow = {
        let pipeline = slow_pipeline.clone();
        tokio::spawn(async move { pipeline.process(r1).await })
    };

    // R2 completes while R1 is still transcribing
    fast_pipeline.process(r2).await.unwrap();
    gate.notify_one();
    slow.await.unwrap().unwrap();

    let timeline = Timeline::build(store.all().await);
    let ordered: Vec<Uuid> = timeline
        .days
        .iter()
        .flat_map(|d| d.records.iter().map(|r| r.id))
        .collect();

    // Newest-first: R2 (later timestamp) precedes R1, despite R2 finishing
    // its pipeline first
    let r1_pos = ordered.iter().position(|id| *id == r1_id).unwrap();
    let r2_pos = ordered.iter().position(|id| *id == r2_id).unwrap();
    assert!(r2_pos < r1_pos);
}

#[tokio::test]
async fn test_persist_failure_does_not_roll_back_upsert() {
    let store = Arc::new(KnowledgeStore::new(Arc::new(BrokenStorage)));
    let pipeline = Arc::new(ProcessingPipeline::new(
        StubTranscriber::ok("kept in memory"),
        StubSummarizer::ok("Kept"),
        StubClassifier::ok(Category::Resources),
        store.clone(),
    ));

    let recording = stopped_recording();
    let record = pipeline.process(recording).await.unwrap();

    assert_eq!(record.stage, Stage::Filed);
    // Durability is degraded but the live view still has the record
    let fetched = store.get(record.id).await.unwrap();
    assert_eq!(fetched.transcript.as_deref(), Some("kept in memory"));
}
