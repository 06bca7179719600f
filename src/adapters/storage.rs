//! JSON catalog persistence for records.
//!
//! A single JSON index file holds the full record set. Writes are
//! serialized behind a mutex; each persist is a load-modify-save of the
//! whole file, which is fine at personal scale.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::Record;

use super::RecordStorage;

/// On-disk catalog format
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    version: u32,
    records: Vec<Record>,
}

impl CatalogFile {
    fn new() -> Self {
        Self {
            version: 1,
            records: Vec::new(),
        }
    }
}

/// Record storage backed by a single JSON catalog file
pub struct JsonStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    async fn read_catalog(&self) -> Result<CatalogFile> {
        if !self.path.exists() {
            return Ok(CatalogFile::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read catalog: {}", self.path.display()))?;

        serde_json::from_str(&content).context("Failed to parse catalog JSON")
    }

    async fn write_catalog(&self, catalog: &CatalogFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(catalog)?;
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write catalog: {}", self.path.display()))?;

        Ok(())
    }
}

#[async_trait]
impl RecordStorage for JsonStorage {
    async fn load(&self) -> Result<Vec<Record>> {
        Ok(self.read_catalog().await?.records)
    }

    async fn persist(&self, record: &Record) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut catalog = self.read_catalog().await?;

        if let Some(existing) = catalog.records.iter_mut().find(|r| r.id == record.id) {
            *existing = record.clone();
        } else {
            catalog.records.push(record.clone());
        }

        self.write_catalog(&catalog).await
    }
}
