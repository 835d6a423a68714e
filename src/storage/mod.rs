//! Local key/value blob storage for persisted session state.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store persists two raw string entries (`token` and `user`).
//! Reads are best-effort: an unreadable store behaves like an empty one.
//! Writes report failures so callers can log them.

pub mod file;


use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use file::FileBlobStore;

use crate::error::StorageError;

/// Persistent string-to-string storage local to the client.
pub trait BlobStore: Send + Sync {
    /// Read the raw value for `key`, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Write the raw value for `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing medium rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`; deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing medium rejects the write.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Load a JSON value stored under `key`.
pub fn load_json<T: DeserializeOwned>(store: &dyn BlobStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "stored value is not valid JSON; ignoring");
            None
        }
    }
}

/// Save a JSON value under `key`.
///
/// # Errors
///
/// Returns a [`StorageError`] if serialization or the write fails.
pub fn save_json<T: Serialize>(store: &dyn BlobStore, key: &str, value: &T) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Json { target: key.to_owned(), source })?;
    store.set(key, &raw)
}

/// Volatile in-process store, used in tests and when no file is configured.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}
