//! Recording session management.
//!
//! The single-recording invariant lives here: a mutex-guarded slot holds
//! at most one active recording, and a second start attempt is rejected
//! rather than silently replacing it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapters::{CaptureBackend, CaptureHandle};
use crate::domain::Recording;

/// Errors surfaced directly to callers of start/stop
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("no active recording")]
    NoActiveRecording,

    #[error("capture backend unavailable: {0}")]
    CaptureUnavailable(String),
}

struct ActiveRecording {
    recording: Recording,
    handle: CaptureHandle,
}

/// Guarded owner of the single active recording slot
pub struct SessionManager {
    capture: Arc<dyn CaptureBackend>,
    recordings_dir: PathBuf,
    active: Mutex<Option<ActiveRecording>>,
}

impl SessionManager {
    pub fn new(capture: Arc<dyn CaptureBackend>, recordings_dir: PathBuf) -> Self {
        Self {
            capture,
            recordings_dir,
            active: Mutex::new(None),
        }
    }

    /// Start a new recording. Rejected while another is active; a capture
    /// failure leaves the slot empty and no state mutated.
    pub async fn start(&self) -> Result<Uuid, SessionError> {
        let mut slot = self.active.lock().await;

        if slot.is_some() {
            return Err(SessionError::AlreadyRecording);
        }

        let id = Uuid::new_v4();
        let output = self.recordings_dir.join(format!("{}.wav", id));

        let handle = self
            .capture
            .start(&output)
            .await
            .map_err(|e| SessionError::CaptureUnavailable(e.to_string()))?;

        let recording = Recording::started(id);
        info!(%id, "Recording started");

        *slot = Some(ActiveRecording { recording, handle });

        Ok(id)
    }

    /// Stop the active recording and return it in the `Stopped` state.
    ///
    /// The slot is cleared even when the capture backend fails to stop
    /// cleanly; a stuck slot would block every future capture.
    pub async fn stop(&self) -> Result<Recording, SessionError> {
        let mut slot = self.active.lock().await;

        let ActiveRecording {
            mut recording,
            handle,
        } = slot.take().ok_or(SessionError::NoActiveRecording)?;

        let captured = match self.capture.stop(handle).await {
            Ok(captured) => captured,
            Err(e) => {
                warn!(id = %recording.id, error = %e, "Capture stop failed");
                return Err(SessionError::CaptureUnavailable(e.to_string()));
            }
        };

        recording.stop(captured.audio_path, captured.duration_seconds);
        info!(
            id = %recording.id,
            duration_seconds = recording.duration_seconds,
            "Recording stopped"
        );

        Ok(recording)
    }

    /// Elapsed capture time; zero whenever no recording is active
    pub async fn elapsed(&self) -> Duration {
        match self.active.lock().await.as_ref() {
            Some(active) => {
                let secs = (Utc::now() - active.recording.started_at)
                    .num_seconds()
                    .max(0) as u64;
                Duration::from_secs(secs)
            }
            None => Duration::ZERO,
        }
    }

    /// Check whether a recording is currently active
    pub async fn is_recording(&self) -> bool {
        self.active.lock().await.is_some()
    }
}
