//! Recording lifecycle state.
//!
//! A Recording tracks a single capture session from start to stop. At most
//! one Recording is in the `Recording` state process-wide; the session
//! module enforces that invariant.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single capture session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    /// Unique identifier, allocated when the session slot is claimed
    pub id: Uuid,

    /// Current lifecycle status
    pub status: RecordingStatus,

    /// When capture started
    pub started_at: DateTime<Utc>,

    /// When capture stopped (if it has)
    pub stopped_at: Option<DateTime<Utc>>,

    /// Opaque reference to the captured audio (owned by the capture backend)
    pub audio_ref: Option<PathBuf>,

    /// Measured capture duration in seconds, set at stop
    pub duration_seconds: u64,
}

impl Recording {
    /// Create a recording in the `Recording` state, started now
    pub fn started(id: Uuid) -> Self {
        Self {
            id,
            status: RecordingStatus::Recording,
            started_at: Utc::now(),
            stopped_at: None,
            audio_ref: None,
            duration_seconds: 0,
        }
    }

    /// Transition to `Stopped`, recording the audio reference and duration.
    ///
    /// Prefers the backend's measured duration; falls back to wall-clock
    /// elapsed time when the backend reports zero.
    pub fn stop(&mut self, audio_ref: PathBuf, measured_seconds: u64) {
        let stopped_at = Utc::now();
        let wall_clock = (stopped_at - self.started_at).num_seconds().max(0) as u64;

        self.status = RecordingStatus::Stopped;
        self.stopped_at = Some(stopped_at);
        self.audio_ref = Some(audio_ref);
        self.duration_seconds = if measured_seconds > 0 {
            measured_seconds
        } else {
            wall_clock
        };
    }

    /// Check if this recording is actively capturing
    pub fn is_recording(&self) -> bool {
        self.status == RecordingStatus::Recording
    }

    /// Check if this recording has completed capture
    pub fn is_stopped(&self) -> bool {
        self.status == RecordingStatus::Stopped
    }
}

/// Lifecycle status of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingStatus {
    /// Created but not capturing
    Idle,

    /// Actively capturing audio
    Recording,

    /// Capture completed, audio reference finalized
    Stopped,

    /// Capture failed (backend error at stop)
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_recording() {
        let id = Uuid::new_v4();
        let recording = Recording::started(id);

        assert_eq!(recording.id, id);
        assert!(recording.is_recording());
        assert!(recording.stopped_at.is_none());
        assert!(recording.audio_ref.is_none());
    }

    #[test]
    fn test_stop_uses_measured_duration() {
        let mut recording = Recording::started(Uuid::new_v4());
        recording.stop(PathBuf::from("/tmp/a.wav"), 42);

        assert!(recording.is_stopped());
        assert_eq!(recording.duration_seconds, 42);
        assert!(recording.stopped_at.is_some());
        assert_eq!(recording.audio_ref, Some(PathBuf::from("/tmp/a.wav")));
    }

    #[test]
    fn test_stop_falls_back_to_wall_clock() {
        let mut recording = Recording::started(Uuid::new_v4());
        recording.stop(PathBuf::from("/tmp/a.wav"), 0);

        // Started and stopped within the same test; wall clock rounds to 0
        assert!(recording.is_stopped());
        assert_eq!(recording.duration_seconds, 0);
    }
}
