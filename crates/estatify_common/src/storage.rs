//! Durable local key-value storage.
//!
//! The push subsystem persists a handful of scalar values (the current push
//! token, the installation id) and reads the session auth token written by
//! the authentication layer. Reads and writes are atomic single-key
//! operations; no transactions span multiple keys.
//!
//! Two implementations are provided: an in-memory store for tests and
//! sandboxed runs, and a JSON-file-backed store for real installations.

use crate::services::BoxFuture;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex as StdMutex;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors that can occur while reading or writing the durable store
#[derive(Error, Debug)]
pub enum StorageError {
    /// Error reading or writing the backing file
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but does not contain a valid key-value map
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A durable key-value store with atomic single-key semantics.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> BoxFuture<'_, Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> BoxFuture<'_, (), StorageError>;

    /// Remove the value stored under `key`. Removing a missing key is not an
    /// error.
    fn remove(&self, key: &str) -> BoxFuture<'_, (), StorageError>;
}

/// An in-memory key-value store.
///
/// Used by tests and by sandboxed runs where nothing needs to survive a
/// process restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: StdMutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // Recover from poisoning: the map itself is always in a valid state.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Option<String>, StorageError> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.entries().get(&key).cloned()) })
    }

    fn put(&self, key: &str, value: &str) -> BoxFuture<'_, (), StorageError> {
        let key = key.to_string();
        let value = value.to_string();
        Box::pin(async move {
            self.entries().insert(key, value);
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, (), StorageError> {
        let key = key.to_string();
        Box::pin(async move {
            self.entries().remove(&key);
            Ok(())
        })
    }
}

/// A key-value store backed by a single JSON file.
///
/// Every write rewrites the whole file, which keeps individual key updates
/// atomic from the caller's point of view. A mutex serializes writers.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Option<String>, StorageError> {
        let key = key.to_string();
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            Ok(self.load().await?.get(&key).cloned())
        })
    }

    fn put(&self, key: &str, value: &str) -> BoxFuture<'_, (), StorageError> {
        let key = key.to_string();
        let value = value.to_string();
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut entries = self.load().await?;
            entries.insert(key, value);
            self.save(&entries).await
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, (), StorageError> {
        let key = key.to_string();
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut entries = self.load().await?;
            if entries.remove(&key).is_some() {
                self.save(&entries).await?;
            }
            Ok(())
        })
    }
}
