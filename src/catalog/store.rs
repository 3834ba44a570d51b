//! Catalog store — the external data source behind the conversation engine.
//!
//! Clubs are read-only and re-read per request (the upstream file is the
//! source of truth and may be edited out of band). Masterclasses are
//! read-write with a full replace-on-write protocol: read the whole
//! collection, mutate, write the whole collection back, writes serialized
//! by an internal lock.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::catalog::{ClubRecord, MasterclassRecord};
use crate::error::StoreError;

/// Backend-agnostic catalog access.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// List all clubs, in catalog order.
    async fn list_clubs(&self) -> Result<Vec<ClubRecord>, StoreError>;

    /// List all masterclasses, in insertion order.
    async fn list_masterclasses(&self) -> Result<Vec<MasterclassRecord>, StoreError>;

    /// Append a masterclass to the end of the collection.
    async fn append_masterclass(&self, record: MasterclassRecord) -> Result<(), StoreError>;

    /// Delete the masterclass at `index` and return it.
    ///
    /// Deletion is positional: records after `index` shift down by one, so
    /// indices rendered before a delete may refer to different records
    /// afterwards. Callers re-list before rendering new choices.
    async fn delete_masterclass(&self, index: usize) -> Result<MasterclassRecord, StoreError>;
}

/// File-backed store: clubs and masterclasses as JSON documents on disk.
pub struct JsonCatalogStore {
    clubs_path: PathBuf,
    masterclasses_path: PathBuf,
    /// Serializes masterclass read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl JsonCatalogStore {
    pub fn new(clubs_path: impl Into<PathBuf>, masterclasses_path: impl Into<PathBuf>) -> Self {
        Self {
            clubs_path: clubs_path.into(),
            masterclasses_path: masterclasses_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_masterclasses(&self) -> Result<Vec<MasterclassRecord>, StoreError> {
        match tokio::fs::read(&self.masterclasses_path).await {
            Ok(bytes) => parse_json(&self.masterclasses_path, &bytes),
            // A missing file is an empty catalog, not a failure: the first
            // admin append creates it.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(unavailable(&self.masterclasses_path, &e)),
        }
    }

    async fn write_masterclasses(&self, records: &[MasterclassRecord]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records).map_err(|e| StoreError::WriteFailed {
            path: self.masterclasses_path.display().to_string(),
            reason: e.to_string(),
        })?;
        tokio::fs::write(&self.masterclasses_path, bytes)
            .await
            .map_err(|e| StoreError::WriteFailed {
                path: self.masterclasses_path.display().to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl CatalogStore for JsonCatalogStore {
    async fn list_clubs(&self) -> Result<Vec<ClubRecord>, StoreError> {
        let bytes = tokio::fs::read(&self.clubs_path)
            .await
            .map_err(|e| unavailable(&self.clubs_path, &e))?;
        parse_json(&self.clubs_path, &bytes)
    }

    async fn list_masterclasses(&self) -> Result<Vec<MasterclassRecord>, StoreError> {
        self.read_masterclasses().await
    }

    async fn append_masterclass(&self, record: MasterclassRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_masterclasses().await?;
        records.push(record);
        self.write_masterclasses(&records).await
    }

    async fn delete_masterclass(&self, index: usize) -> Result<MasterclassRecord, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_masterclasses().await?;
        if index >= records.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: records.len(),
            });
        }
        let removed = records.remove(index);
        self.write_masterclasses(&records).await?;
        Ok(removed)
    }
}

/// In-memory store for tests and local development.
#[derive(Default)]
pub struct MemoryCatalogStore {
    clubs: Vec<ClubRecord>,
    masterclasses: RwLock<Vec<MasterclassRecord>>,
}

impl MemoryCatalogStore {
    pub fn new(clubs: Vec<ClubRecord>, masterclasses: Vec<MasterclassRecord>) -> Self {
        Self {
            clubs,
            masterclasses: RwLock::new(masterclasses),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn list_clubs(&self) -> Result<Vec<ClubRecord>, StoreError> {
        Ok(self.clubs.clone())
    }

    async fn list_masterclasses(&self) -> Result<Vec<MasterclassRecord>, StoreError> {
        Ok(self.masterclasses.read().await.clone())
    }

    async fn append_masterclass(&self, record: MasterclassRecord) -> Result<(), StoreError> {
        self.masterclasses.write().await.push(record);
        Ok(())
    }

    async fn delete_masterclass(&self, index: usize) -> Result<MasterclassRecord, StoreError> {
        let mut records = self.masterclasses.write().await;
        if index >= records.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: records.len(),
            });
        }
        Ok(records.remove(index))
    }
}

fn unavailable(path: &Path, err: &std::io::Error) -> StoreError {
    StoreError::Unavailable {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
