//! Subprocess audio capture backend.
//!
//! Spawns a capture command (ffmpeg by default) that writes WAV to the
//! target path until stopped. Duration is measured by wall clock; backends
//! that can report an exact duration may do better, the pipeline accepts
//! either.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{CaptureBackend, CaptureHandle, CapturedAudio};

struct ActiveCapture {
    child: Child,
    output: std::path::PathBuf,
    started: Instant,
}

/// Capture backend shelling out to ffmpeg (or a compatible command)
pub struct FfmpegCapture {
    binary_path: String,
    /// Arguments inserted before the output path, e.g. the input device
    input_args: Vec<String>,
    next_handle: AtomicU64,
    active: Mutex<HashMap<u64, ActiveCapture>>,
}

impl FfmpegCapture {
    /// Create a backend with default arguments for the host platform
    pub fn new() -> Self {
        Self::with_command("ffmpeg", default_input_args())
    }

    /// Create a backend with a custom binary and input arguments
    pub fn with_command(binary_path: impl Into<String>, input_args: Vec<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            input_args,
            next_handle: AtomicU64::new(1),
            active: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for FfmpegCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Default device arguments per platform
fn default_input_args() -> Vec<String> {
    let args: &[&str] = if cfg!(target_os = "macos") {
        &["-f", "avfoundation", "-i", ":0"]
    } else {
        &["-f", "alsa", "-i", "default"]
    };
    args.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl CaptureBackend for FfmpegCapture {
    async fn start(&self, output: &Path) -> Result<CaptureHandle> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let child = Command::new(&self.binary_path)
            .args(&self.input_args)
            .arg("-y")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn capture process '{}'", self.binary_path))?;

        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        debug!(handle = id, output = %output.display(), "Capture started");

        self.active.lock().await.insert(
            id,
            ActiveCapture {
                child,
                output: output.to_path_buf(),
                started: Instant::now(),
            },
        );

        Ok(CaptureHandle(id))
    }

    async fn stop(&self, handle: CaptureHandle) -> Result<CapturedAudio> {
        let mut capture = self
            .active
            .lock()
            .await
            .remove(&handle.0)
            .context("Unknown capture handle")?;

        let duration_seconds = capture.started.elapsed().as_secs();

        // Ask the process to quit and let it finalize the container; a hard
        // kill would leave the WAV size headers unwritten. ffmpeg exits on
        // 'q', anything else exits on stdin EOF.
        if let Some(mut stdin) = capture.child.stdin.take() {
            let _ = stdin.write_all(b"q").await;
            let _ = stdin.shutdown().await;
        }

        match timeout(Duration::from_secs(5), capture.child.wait()).await {
            Ok(Ok(status)) => {
                debug!(handle = handle.0, %status, "Capture process exited");
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Capture process did not exit cleanly");
            }
            Err(_) => {
                warn!(handle = handle.0, "Capture process ignored quit, killing");
                capture
                    .child
                    .start_kill()
                    .context("Failed to kill capture process")?;
                if let Err(e) = capture.child.wait().await {
                    warn!(error = %e, "Capture process did not exit after kill");
                }
            }
        }

        if !capture.output.exists() {
            anyhow::bail!(
                "Capture produced no audio file at {}",
                capture.output.display()
            );
        }

        debug!(handle = handle.0, duration_seconds, "Capture stopped");

        Ok(CapturedAudio {
            audio_path: capture.output,
            duration_seconds,
        })
    }
}
