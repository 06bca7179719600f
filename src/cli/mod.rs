//! Command-line interface for memoflow.
//!
//! Provides commands for capturing a recording, browsing the timeline and
//! PARA folders, inspecting records, reprocessing stalled ones, and
//! fetching the daily digest.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::adapters::{
    FabricBackend, FfmpegCapture, JsonStorage, PlaceholderDigest, WhisperTranscriber,
};
use crate::config;
use crate::core::{Collaborators, Hub};
use crate::domain::{Category, Record, Stage};

/// memoflow - voice capture filed into PARA
#[derive(Parser, Debug)]
#[command(name = "memoflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture a recording: starts now, stops on Enter, then processes it
    Record {
        /// Exit without waiting for transcription and filing to finish
        #[arg(long)]
        no_wait: bool,
    },

    /// Show the day-grouped timeline of records
    Timeline {
        /// Maximum number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show the PARA folders, or a single bucket
    Folders {
        /// Bucket to show (all four if omitted)
        #[arg(value_enum)]
        bucket: Option<BucketArg>,
    },

    /// Show details of one record
    Show {
        /// Record ID (UUID)
        id: String,

        /// Print the full transcript
        #[arg(short, long)]
        full: bool,
    },

    /// Re-run the missing pipeline stages of a record
    Reprocess {
        /// Record ID to reprocess
        id: String,
    },

    /// Show the digest for a date
    Digest {
        /// Date (YYYY-MM-DD, defaults to today)
        date: Option<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// PARA bucket for CLI (maps to Category)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BucketArg {
    Projects,
    Areas,
    Resources,
    Archives,
}

impl From<BucketArg> for Category {
    fn from(b: BucketArg) -> Self {
        match b {
            BucketArg::Projects => Category::Projects,
            BucketArg::Areas => Category::Areas,
            BucketArg::Resources => Category::Resources,
            BucketArg::Archives => Category::Archives,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Record { no_wait } => record(no_wait).await,
            Commands::Timeline { limit } => show_timeline(limit).await,
            Commands::Folders { bucket } => show_folders(bucket).await,
            Commands::Show { id, full } => show_record(&id, full).await,
            Commands::Reprocess { id } => reprocess(&id).await,
            Commands::Digest { date } => show_digest(date.as_deref()).await,
            Commands::Config => show_config(),
        }
    }
}

/// Build the hub with the configured production adapters
async fn open_hub() -> Result<Hub> {
    let config = config::config()?;

    // One fabric backend serves both model-facing traits
    let fabric = Arc::new(FabricBackend::new(
        &config.fabric.binary,
        &config.fabric.summarize_pattern,
        &config.fabric.classify_pattern,
        config.fabric.timeout,
    ));

    let collaborators = Collaborators {
        capture: Arc::new(FfmpegCapture::new()),
        transcriber: Arc::new(WhisperTranscriber::new(
            &config.whisper.binary,
            &config.whisper.model,
        )),
        summarizer: fabric.clone(),
        classifier: fabric,
        storage: Arc::new(JsonStorage::new(config.catalog_path.clone())),
        digest: Arc::new(PlaceholderDigest),
    };

    Hub::open(config, collaborators).await
}

async fn record(no_wait: bool) -> Result<()> {
    let hub = open_hub().await?;

    let id = hub.start_recording().await?;
    println!("Recording {} started. Press Enter to stop.", id);

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read stdin")?;

    let pending = hub.stop_recording().await?;
    println!("Stopped after {}s.", pending.duration_seconds);

    if no_wait {
        // The seed is already saved; processing can finish later
        println!(
            "Record {} is processing in the background; `memoflow show {}` or \
             `memoflow reprocess {}` if it stalls.",
            pending.id, pending.id, pending.id
        );
        return Ok(());
    }
    println!("Processing...");

    let record = pending.wait().await?;
    print_record(&record, false);

    Ok(())
}

async fn show_timeline(limit: usize) -> Result<()> {
    let hub = open_hub().await?;
    let timeline = hub.timeline().await;

    if timeline.is_empty() {
        println!("No records yet. Try `memoflow record`.");
        return Ok(());
    }

    let mut shown = 0;
    for day in &timeline.days {
        if shown >= limit {
            break;
        }
        println!("{}", day.day.format("%A, %B %-d %Y"));
        for record in &day.records {
            if shown >= limit {
                break;
            }
            println!(
                "  {}  [{}] {}  ({}s)",
                record.timestamp.with_timezone(&Local).format("%H:%M"),
                record
                    .category
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "—".to_string()),
                record.title(),
                record.duration_seconds,
            );
            shown += 1;
        }
    }

    Ok(())
}

async fn show_folders(bucket: Option<BucketArg>) -> Result<()> {
    let hub = open_hub().await?;
    let folders = hub.folders().await;

    let buckets: Vec<Category> = match bucket {
        Some(b) => vec![b.into()],
        None => Category::ALL.to_vec(),
    };

    for category in buckets {
        let records = folders.bucket(category);
        println!("{} ({})", category, records.len());
        for record in records {
            println!("  {}  {}", record.id, record.title());
        }
    }

    Ok(())
}

async fn show_record(id: &str, full: bool) -> Result<()> {
    let id = parse_id(id)?;
    let hub = open_hub().await?;
    let record = hub.record(id).await?;

    print_record(&record, full);
    Ok(())
}

async fn reprocess(id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let hub = open_hub().await?;

    let record = hub.reprocess(id).await?;
    print_record(&record, false);

    Ok(())
}

async fn show_digest(date: Option<&str>) -> Result<()> {
    let date = match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))?,
        None => Local::now().date_naive(),
    };

    let hub = open_hub().await?;
    let digest = hub.digest(date).await?;

    println!("Digest for {}", digest.date);
    println!("\n{}\n", digest.narrative);
    for highlight in &digest.highlights {
        println!("  {}  {}", highlight.time.format("%H:%M"), highlight.text);
    }
    if !digest.action_items.is_empty() {
        println!("\nAction items:");
        for item in &digest.action_items {
            println!("  - {}", item);
        }
    }

    Ok(())
}

fn show_config() -> Result<()> {
    let config = config::config()?;

    println!("home:           {}", config.home.display());
    println!("recordings_dir: {}", config.recordings_dir.display());
    println!("catalog:        {}", config.catalog_path.display());
    match &config.config_file {
        Some(path) => println!("config_file:    {}", path.display()),
        None => println!("config_file:    (none, using defaults)"),
    }
    println!("whisper:        {} ({})", config.whisper.binary, config.whisper.model);
    println!(
        "fabric:         {} (summarize={}, classify={})",
        config.fabric.binary, config.fabric.summarize_pattern, config.fabric.classify_pattern
    );

    Ok(())
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("Invalid record id '{}'", id))
}

fn print_record(record: &Record, full: bool) {
    println!("record    {}", record.id);
    println!("captured  {}", record.timestamp.with_timezone(&Local));
    println!("duration  {}s", record.duration_seconds);
    println!(
        "category  {}",
        record
            .category
            .map(|c| c.to_string())
            .unwrap_or_else(|| "(unclassified)".to_string())
    );

    match &record.stage {
        Stage::Filed => println!("stage     filed"),
        Stage::PartiallyFailed { failed, reason } => {
            println!("stage     failed while {}: {}", failed, reason)
        }
        other => println!("stage     in progress ({:?})", other),
    }

    if let Some(summary) = &record.summary {
        println!("\n{}", summary);
    }

    if let Some(transcript) = &record.transcript {
        if full {
            println!("\n--- transcript ---\n{}", transcript);
        } else if record.summary.is_none() {
            println!("\n{}", record.title());
        }
    }
}
