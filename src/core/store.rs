//! The knowledge store: the process-wide authoritative record set.
//!
//! Records are keyed by id; `upsert` is last-writer-wins, which is safe
//! because each id is owned by exactly one pipeline until terminal. Every
//! upsert also requests persistence, fire-and-forget: a persist failure is
//! logged and never rolls back the in-memory state, so captured knowledge
//! stays in the live view even when durability is degraded.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::adapters::RecordStorage;
use crate::domain::Record;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(Uuid),
}

/// In-memory record set with write-through persistence
pub struct KnowledgeStore {
    records: RwLock<HashMap<Uuid, Record>>,
    storage: Arc<dyn RecordStorage>,
}

impl KnowledgeStore {
    /// Create an empty store (no load from storage)
    pub fn new(storage: Arc<dyn RecordStorage>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            storage,
        }
    }

    /// Rebuild the store from persisted storage at startup
    pub async fn load(storage: Arc<dyn RecordStorage>) -> Result<Self> {
        let loaded = storage.load().await?;

        let records = loaded.into_iter().map(|r| (r.id, r)).collect();

        Ok(Self {
            records: RwLock::new(records),
            storage,
        })
    }

    /// Insert or replace by id, then request persistence
    pub async fn upsert(&self, record: Record) {
        self.records.write().await.insert(record.id, record.clone());

        if let Err(e) = self.storage.persist(&record).await {
            warn!(id = %record.id, error = %e, "Failed to persist record");
        }
    }

    /// Fetch a record by id
    pub async fn get(&self, id: Uuid) -> Result<Record, StoreError> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    /// Snapshot of all records, order unspecified
    pub async fn all(&self) -> Vec<Record> {
        self.records.read().await.values().cloned().collect()
    }

    /// Number of records in the store
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
