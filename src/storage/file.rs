//! JSON-file blob store.
//!
//! The whole store is one JSON object of string values. Writes go to a
//! sibling temp file and are renamed over the original, so a crash never
//! leaves a half-written store behind.

#[cfg(test)]
#[path = "file_test.rs"]
mod file_test;

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::BlobStore;
use crate::error::StorageError;

#[derive(Debug)]
pub struct FileBlobStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBlobStore {
    /// Store backed by `path`; the file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn target(&self) -> String {
        self.path.display().to_string()
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => return Err(StorageError::Io { target: self.target(), source }),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| StorageError::Json { target: self.target(), source })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StorageError::Io { target: self.target(), source })?;
            }
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|source| StorageError::Json { target: self.target(), source })?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|source| StorageError::Io { target: tmp.display().to_string(), source })?;
        fs::rename(&tmp, &self.path).map_err(|source| StorageError::Io { target: self.target(), source })
    }

    fn update<F>(&self, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(StorageError::Json { .. }) => {
                tracing::warn!(path = %self.path.display(), "session store is corrupt; starting over");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        mutate(&mut entries);
        self.write_entries(&entries)
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.read_entries() {
            Ok(mut entries) => entries.remove(key),
            Err(e) => {
                tracing::warn!(key, error = %e, "session store unreadable");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
