//! Record persistence.
//!
//! Each record type owns one slot in a key-value backend. A slot holds the whole list of
//! records as a versioned JSON envelope and is overwritten wholesale on every save.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::models::{EntityKind, Record};

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::InMemoryStorage;

/// Version written into every envelope. Slots tagged with a newer version are not read.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
    #[error("Unsupported schema version {found} (newest known is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("Slot holds {found} records, expected {expected}")]
    KindMismatch {
        expected: EntityKind,
        found: EntityKind,
    },
    #[error("Storage backend failed: {0}")]
    Backend(String),
}

/// A durable string key-value store.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn contains(&self, key: &str) -> Result<bool, StorageError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    kind: EntityKind,
    records: T,
}

/// Typed access to the record slots of a [`StorageBackend`].
#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore").finish_non_exhaustive()
    }
}

impl RecordStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStorage::new()))
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Reads every stored record of type `R`, in stored order.
    ///
    /// An absent slot, an unreadable backend and undecodable contents all yield an empty list.
    /// Failures are logged and never returned.
    pub fn load<R: Record>(&self) -> Vec<R> {
        let key = R::KIND.storage_key();
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, key, "Failed to read storage slot; treating as empty");
                return Vec::new();
            }
        };

        match decode::<R>(&raw) {
            Ok(records) => {
                debug!(key, count = records.len(), "Loaded records");
                records
            }
            Err(e) => {
                warn!(error = %e, key, "Stored records could not be decoded; treating as empty");
                Vec::new()
            }
        }
    }

    /// Reads the stored list for `R` ahead of a read-modify-write.
    ///
    /// Unlike [`RecordStore::load`], a slot written by a newer schema or holding another kind
    /// of record is an error: rewriting it would drop data this build cannot see. Contents that
    /// are not valid JSON at all are still treated as empty.
    pub fn load_for_write<R: Record>(&self) -> Result<Vec<R>, StorageError> {
        let key = R::KIND.storage_key();
        let raw = match self.backend.get(key)? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };

        match decode::<R>(&raw) {
            Ok(records) => Ok(records),
            Err(StorageError::Serialization(e)) => {
                warn!(error = %e, key, "Overwriting undecodable storage slot");
                Ok(Vec::new())
            }
            Err(e) => {
                warn!(error = %e, key, "Refusing to overwrite storage slot");
                Err(e)
            }
        }
    }

    /// Replaces the stored list for `R` with `records`.
    pub fn save<R: Record>(&self, records: &[R]) -> Result<(), StorageError> {
        let key = R::KIND.storage_key();
        let payload = serde_json::to_string(&Envelope {
            version: SCHEMA_VERSION,
            kind: R::KIND,
            records,
        })?;
        self.backend.set(key, &payload)?;
        debug!(key, count = records.len(), "Saved records");
        Ok(())
    }

    /// Removes the slot for `R` entirely.
    pub fn clear<R: Record>(&self) -> Result<(), StorageError> {
        let key = R::KIND.storage_key();
        self.backend.remove(key)?;
        info!(key, "Cleared storage slot");
        Ok(())
    }

    /// Whether the slot for `R` has ever been written (an empty list counts).
    pub fn is_initialized<R: Record>(&self) -> Result<bool, StorageError> {
        self.backend.contains(R::KIND.storage_key())
    }
}

fn decode<R: Record>(raw: &str) -> Result<Vec<R>, StorageError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if value.is_array() {
        // Written before envelopes existed.
        return Ok(serde_json::from_value(value)?);
    }

    let envelope: Envelope<serde_json::Value> = serde_json::from_value(value)?;
    if envelope.version > SCHEMA_VERSION {
        return Err(StorageError::UnsupportedVersion {
            found: envelope.version,
            supported: SCHEMA_VERSION,
        });
    }
    if envelope.kind != R::KIND {
        return Err(StorageError::KindMismatch {
            expected: R::KIND,
            found: envelope.kind,
        });
    }
    Ok(serde_json::from_value(envelope.records)?)
}

pub struct StorageFactory;

impl StorageFactory {
    pub fn create(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>, StorageError> {
        if config.is_file_backend() {
            let storage = FileStorage::new(config.data_dir())?;
            info!(dir = %config.data_dir, "Using file storage");
            return Ok(Arc::new(storage));
        }

        info!("Using in-memory storage");
        Ok(Arc::new(InMemoryStorage::new()))
    }
}
