//! In-memory stores for tests and one-shot CLI runs.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{check_key, BlobStore, RecordStore};
use crate::error::StorageError;
use crate::orchestrator::ImageRecord;
use crate::types::{ImageId, Locator};

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<BTreeMap<ImageId, ImageRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, id: &ImageId) -> Result<Option<ImageRecord>, StorageError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn put(&self, record: &ImageRecord) -> Result<(), StorageError> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ImageRecord>, StorageError> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<Locator, StorageError> {
        check_key(key)?;
        self.blobs
            .write()
            .await
            .insert(key.to_string(), bytes.to_vec());
        Ok(Locator(key.to_string()))
    }

    async fn get(&self, locator: &Locator) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .read()
            .await
            .get(&locator.0)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(locator.0.clone()))
    }

    async fn delete(&self, locator: &Locator) -> Result<(), StorageError> {
        self.blobs.write().await.remove(&locator.0);
        Ok(())
    }
}
