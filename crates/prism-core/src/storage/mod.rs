//! Persistence collaborators: image records and binary blobs.
//!
//! Both seams are async traits so the orchestrator can run against the
//! in-memory stores in tests and the CLI, or the filesystem stores under
//! the configured state directory.

mod fs;
mod memory;

pub use fs::{FsBlobStore, FsRecordStore};
pub use memory::{MemoryBlobStore, MemoryRecordStore};

use async_trait::async_trait;

use crate::error::StorageError;
use crate::orchestrator::ImageRecord;
use crate::types::{ImageId, Locator};

/// Keyed storage of [`ImageRecord`]s.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, id: &ImageId) -> Result<Option<ImageRecord>, StorageError>;

    /// Insert or replace the record with the same id.
    async fn put(&self, record: &ImageRecord) -> Result<(), StorageError>;

    /// All records, ordered by id.
    async fn list(&self) -> Result<Vec<ImageRecord>, StorageError>;
}

/// Opaque binary storage addressed by [`Locator`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<Locator, StorageError>;

    /// Fails with [`StorageError::NotFound`] for unknown locators.
    async fn get(&self, locator: &Locator) -> Result<Vec<u8>, StorageError>;

    /// Deleting a missing blob is not an error.
    async fn delete(&self, locator: &Locator) -> Result<(), StorageError>;
}

/// Reject keys that could escape a store's root.
pub(crate) fn check_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(StorageError::Backend(format!("invalid storage key: {key:?}")));
    }
    Ok(())
}
