//! Fabric-backed summarization and classification.
//!
//! Runs fabric patterns via subprocess, piping the input to stdin and
//! collecting stdout. One backend serves both model-facing traits: the
//! summarize pattern produces `summary`, the categorize pattern's output
//! is parsed into a PARA bucket.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::domain::Category;

use super::{Classifier, Summarizer};

/// Summarizer/classifier shelling out to the fabric CLI
pub struct FabricBackend {
    binary_path: String,
    summarize_pattern: String,
    classify_pattern: String,
    call_timeout: Duration,
}

impl FabricBackend {
    pub fn new(
        binary_path: impl Into<String>,
        summarize_pattern: impl Into<String>,
        classify_pattern: impl Into<String>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            binary_path: binary_path.into(),
            summarize_pattern: summarize_pattern.into(),
            classify_pattern: classify_pattern.into(),
            call_timeout,
        }
    }

    /// Run a pattern via subprocess, feeding `input` on stdin
    async fn run_pattern(&self, pattern: &str, input: &str) -> Result<String> {
        let mut child = Command::new(&self.binary_path)
            .args(["-p", pattern])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn fabric for pattern '{}'", pattern))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .await
                .context("Failed to write to fabric stdin")?;
            // Drop stdin to signal EOF
        }

        let output = timeout(self.call_timeout, child.wait_with_output())
            .await
            .with_context(|| {
                format!(
                    "Fabric pattern '{}' timed out after {:?}",
                    pattern, self.call_timeout
                )
            })?
            .with_context(|| format!("Failed to wait for fabric pattern '{}'", pattern))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Fabric pattern '{}' failed with exit code {}: {}",
                pattern,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        let stdout =
            String::from_utf8(output.stdout).context("Fabric output is not valid UTF-8")?;

        Ok(stdout.trim().to_string())
    }
}

#[async_trait]
impl Summarizer for FabricBackend {
    async fn summarize(&self, transcript: &str) -> Result<String> {
        self.run_pattern(&self.summarize_pattern, transcript).await
    }
}

#[async_trait]
impl Classifier for FabricBackend {
    async fn classify(&self, transcript: &str, summary: Option<&str>) -> Result<Category> {
        // Summary first when present, so the model classifies from the
        // condensed form with the transcript as backup context
        let input = match summary {
            Some(summary) => format!("{}\n\n---\n\n{}", summary, transcript),
            None => transcript.to_string(),
        };

        let output = self.run_pattern(&self.classify_pattern, &input).await?;

        Category::parse(&output).with_context(|| {
            format!("Classifier did not name a PARA bucket: '{}'", output)
        })
    }
}
