//! Filesystem-backed stores.
//!
//! Records are one pretty-printed JSON file per image; blobs are plain
//! files named by their key. Writes go to a temp file first and are then
//! renamed into place, so readers never see a half-written file.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{check_key, BlobStore, RecordStore};
use crate::error::StorageError;
use crate::orchestrator::ImageRecord;
use crate::types::{ImageId, Locator};

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// One `<id>.json` file per record under `root`.
#[derive(Debug, Clone)]
pub struct FsRecordStore {
    root: PathBuf,
}

impl FsRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &ImageId) -> Result<PathBuf, StorageError> {
        check_key(id.as_str())?;
        if id.as_str().contains('/') {
            return Err(StorageError::Backend(format!("invalid record id: {id}")));
        }
        Ok(self.root.join(format!("{id}.json")))
    }
}

#[async_trait]
impl RecordStore for FsRecordStore {
    async fn get(&self, id: &ImageId) -> Result<Option<ImageRecord>, StorageError> {
        let path = self.path_for(id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, record: &ImageRecord) -> Result<(), StorageError> {
        let path = self.path_for(&record.id)?;
        let json = serde_json::to_string_pretty(record)?;
        write_atomic(&path, json.as_bytes()).await
    }

    async fn list(&self) -> Result<Vec<ImageRecord>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<ImageRecord>(&content) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Skipping unreadable record {path:?}: {e}"),
            }
        }
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}

/// Blobs stored as files at `root/<key>`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Filesystem path of a stored blob.
    pub fn path_of(&self, locator: &Locator) -> Result<PathBuf, StorageError> {
        check_key(&locator.0)?;
        Ok(self.root.join(&locator.0))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<Locator, StorageError> {
        let locator = Locator(key.to_string());
        write_atomic(&self.path_of(&locator)?, bytes).await?;
        Ok(locator)
    }

    async fn get(&self, locator: &Locator) -> Result<Vec<u8>, StorageError> {
        match tokio::fs::read(self.path_of(locator)?).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(locator.0.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, locator: &Locator) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_of(locator)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::ImageStatus;

    #[tokio::test]
    async fn test_record_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRecordStore::new(dir.path().join("records"));
        let mut record = ImageRecord::new(
            ImageId::new("beach"),
            "hash".into(),
            Locator("originals/beach".into()),
        );
        record.status = ImageStatus::Analyzed;
        store.put(&record).await.unwrap();

        let reopened = FsRecordStore::new(dir.path().join("records"));
        assert_eq!(reopened.get(&record.id).await.unwrap(), Some(record.clone()));
        assert_eq!(reopened.list().await.unwrap().len(), 1);
        assert!(!dir.path().join("records/beach.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_record_store_missing_dir_and_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRecordStore::new(dir.path().join("nope"));
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.get(&ImageId::new("x")).await.unwrap().is_none());

        std::fs::create_dir_all(dir.path().join("nope")).unwrap();
        std::fs::write(dir.path().join("nope/broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("nope/notes.txt"), "hi").unwrap();
        assert!(store.list().await.unwrap().is_empty());

        assert!(store.get(&ImageId::new("../escape")).await.is_err());
    }

    #[tokio::test]
    async fn test_blob_store_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        let loc = store.put("originals/cat", b"meow").await.unwrap();
        assert!(dir.path().join("originals/cat").exists());
        assert_eq!(store.get(&loc).await.unwrap(), b"meow");

        store.delete(&loc).await.unwrap();
        store.delete(&loc).await.unwrap();
        assert!(matches!(store.get(&loc).await, Err(StorageError::NotFound(_))));
    }
}
