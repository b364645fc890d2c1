//! Device identity service.
//!
//! Each installation carries a stable device identifier used to key analytics
//! and progress records. The identifier is created on first use, persisted
//! through an injected `KeyValueStore` capability, and can be explicitly
//! reset. Consumers receive the service as a dependency; there is no process
//! global to reach for.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use uuid::Uuid;

/// Errors from key-value persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem operation failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be read back as a string map.
    #[error("corrupt store data: {0}")]
    Corrupt(String),
}

/// Persistent string key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value for `key`, `None` if absent.
    ///
    /// # Errors
    ///
    /// - `StoreError::Io` - Backing storage unreadable
    /// - `StoreError::Corrupt` - Stored data unparseable
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// - `StoreError::Io` - Backing storage unwritable
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON-file backed store.
///
/// The whole map is rewritten on every `set` through a temp file renamed into
/// place, so a crash mid-write never leaves a torn file behind.
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn read_map(&self) -> Result<HashMap<String, String>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_map().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());

        let bytes =
            serde_json::to_vec_pretty(&map).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, bytes).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

/// Stable per-installation identifier with init-on-first-use semantics.
pub struct DeviceIdentity {
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
    cached: Mutex<Option<String>>,
}

impl DeviceIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>, storage_key: impl Into<String>) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
            cached: Mutex::new(None),
        }
    }

    /// Returns the device identifier, generating and persisting one on first
    /// use.
    ///
    /// # Errors
    ///
    /// - `StoreError` - Persistence failed; no identifier is cached in that case
    pub async fn identifier(&self) -> Result<String, StoreError> {
        if let Some(id) = self.cached.lock().clone() {
            return Ok(id);
        }

        if let Some(id) = self.store.get(&self.storage_key).await? {
            *self.cached.lock() = Some(id.clone());
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        self.store.set(&self.storage_key, &id).await?;
        *self.cached.lock() = Some(id.clone());
        tracing::info!(device_id = %id, "generated device identifier");
        Ok(id)
    }

    /// Discards the current identifier and persists a fresh one.
    ///
    /// # Errors
    ///
    /// - `StoreError` - Persistence failed; the old identifier remains in place
    pub async fn reset(&self) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.store.set(&self.storage_key, &id).await?;
        *self.cached.lock() = Some(id.clone());
        tracing::info!(device_id = %id, "device identifier reset");
        Ok(id)
    }
}
