//! Records and their pipeline progress.
//!
//! A Record is the knowledge artifact derived from a completed Recording.
//! It is visible in the knowledge store from the moment the pipeline seeds
//! it, so partially processed records are never silently dropped; `stage`
//! carries how far processing got and why it stalled, if it did.

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::recording::Recording;

/// A knowledge record derived from a completed capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Same id as the Recording it was derived from
    pub id: Uuid,

    /// When the capture stopped
    pub timestamp: DateTime<Utc>,

    /// Capture duration in seconds
    pub duration_seconds: u64,

    /// Reference to the captured audio file
    pub audio_ref: PathBuf,

    /// Transcript text; empty string is a valid (empty) transcript
    #[serde(default)]
    pub transcript: Option<String>,

    /// Summary text; absent if summarization failed or was skipped
    #[serde(default)]
    pub summary: Option<String>,

    /// PARA category; absent if classification failed or was skipped
    #[serde(default)]
    pub category: Option<Category>,

    /// How far the pipeline progressed
    pub stage: Stage,
}

impl Record {
    /// Seed a record from a stopped recording, ready for transcription
    pub fn from_recording(recording: &Recording) -> Self {
        Self {
            id: recording.id,
            timestamp: recording.stopped_at.unwrap_or(recording.started_at),
            duration_seconds: recording.duration_seconds,
            audio_ref: recording.audio_ref.clone().unwrap_or_default(),
            transcript: None,
            summary: None,
            category: None,
            stage: Stage::Transcribing,
        }
    }

    /// Calendar day this record belongs to, in local time
    pub fn day(&self) -> NaiveDate {
        self.timestamp.with_timezone(&Local).date_naive()
    }

    /// Best-available display title: summary first, then a transcript
    /// prefix, then a placeholder. Partially failed records still render.
    pub fn title(&self) -> String {
        if let Some(summary) = self.summary.as_deref() {
            if let Some(line) = summary.lines().find(|l| !l.trim().is_empty()) {
                return line.trim().to_string();
            }
        }

        if let Some(transcript) = self.transcript.as_deref() {
            let trimmed = transcript.trim();
            if !trimmed.is_empty() {
                let prefix: String = trimmed.chars().take(80).collect();
                return prefix;
            }
        }

        format!("(unprocessed recording {})", self.id)
    }
}

/// Pipeline progress marker on a Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum Stage {
    /// Waiting on or running transcription
    Transcribing,

    /// Transcript available, waiting on or running summarization
    Summarizing,

    /// Summary available, waiting on or running classification
    Classifying,

    /// Fully processed and filed
    Filed,

    /// A stage failed; no later stage was attempted
    PartiallyFailed { failed: PipelineStage, reason: String },
}

impl Stage {
    /// Terminal stages end pipeline ownership of the record
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Filed | Stage::PartiallyFailed { .. })
    }
}

/// The three processing stages, used to name where a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Transcribing,
    Summarizing,
    Classifying,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Transcribing => "transcribing",
            Self::Summarizing => "summarizing",
            Self::Classifying => "classifying",
        };
        write!(f, "{}", name)
    }
}

/// The four PARA buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Projects,
    Areas,
    Resources,
    Archives,
}

impl Category {
    /// All buckets, in canonical display order
    pub const ALL: [Category; 4] = [
        Category::Projects,
        Category::Areas,
        Category::Resources,
        Category::Archives,
    ];

    /// Canonical bucket name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Projects => "Projects",
            Self::Areas => "Areas",
            Self::Resources => "Resources",
            Self::Archives => "Archives",
        }
    }

    /// Parse a classifier response into a bucket.
    ///
    /// Classifier output is free text; scan for the first bucket name
    /// mentioned, case-insensitive. Returns None when no bucket is named,
    /// which the pipeline treats as a classification failure.
    pub fn parse(output: &str) -> Option<Category> {
        let lower = output.to_lowercase();

        let mut best: Option<(usize, Category)> = None;
        for category in Self::ALL {
            let needle = category.as_str().to_lowercase();
            if let Some(pos) = lower.find(&needle) {
                if best.map(|(p, _)| pos < p).unwrap_or(true) {
                    best = Some((pos, category));
                }
            }
        }

        best.map(|(_, c)| c)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stopped_recording() -> Recording {
        let mut recording = Recording::started(Uuid::new_v4());
        recording.stop(PathBuf::from("/tmp/r.wav"), 10);
        recording
    }

    #[test]
    fn test_seed_from_recording() {
        let recording = stopped_recording();
        let record = Record::from_recording(&recording);

        assert_eq!(record.id, recording.id);
        assert_eq!(record.timestamp, recording.stopped_at.unwrap());
        assert_eq!(record.duration_seconds, 10);
        assert_eq!(record.stage, Stage::Transcribing);
        assert!(record.transcript.is_none());
    }

    #[test]
    fn test_title_fallback_order() {
        let mut record = Record::from_recording(&stopped_recording());
        assert!(record.title().starts_with("(unprocessed"));

        record.transcript = Some("hello world, this is a transcript".to_string());
        assert_eq!(record.title(), "hello world, this is a transcript");

        record.summary = Some("Meeting notes\nmore detail".to_string());
        assert_eq!(record.title(), "Meeting notes");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("Projects"), Some(Category::Projects));
        assert_eq!(Category::parse("  archives\n"), Some(Category::Archives));
        assert_eq!(
            Category::parse("This belongs in RESOURCES."),
            Some(Category::Resources)
        );
        assert_eq!(Category::parse("no bucket here"), None);
    }

    #[test]
    fn test_category_parse_first_mention_wins() {
        assert_eq!(
            Category::parse("Areas, though Archives was close"),
            Some(Category::Areas)
        );
    }

    #[test]
    fn test_stage_serialization_round_trip() {
        let stage = Stage::PartiallyFailed {
            failed: PipelineStage::Summarizing,
            reason: "model timeout".to_string(),
        };

        let json = serde_json::to_string(&stage).unwrap();
        let parsed: Stage = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, stage);
        assert!(parsed.is_terminal());
        assert!(!Stage::Classifying.is_terminal());
    }
}
