//! File-backed storage.
//!
//! All keys live in one JSON document on disk. Every write rewrites the
//! whole file, which is fine at the handful-of-kilobytes scale this
//! store holds.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{StorageBackend, StorageError};

/// Persistent backend storing all keys in a single JSON file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or create) the store at `path`.
    ///
    /// Parent directories are created if missing. A corrupt document is
    /// logged and replaced with an empty one on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %error,
                        "Discarding corrupt storage file"
                    );
                    HashMap::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(error) => return Err(error.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// The file this store persists to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw).map_err(|error| {
            if error.kind() == std::io::ErrorKind::StorageFull {
                StorageError::QuotaExceeded
            } else {
                error.into()
            }
        })
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let previous = entries.insert(key.to_owned(), value.to_owned());
        if let Err(error) = self.flush(&entries) {
            // Undo the cached change so memory and disk stay in step.
            match previous {
                Some(previous) => entries.insert(key.to_owned(), previous),
                None => entries.remove(key),
            };
            return Err(error);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let previous = entries.remove(key);
        if previous.is_some() {
            if let Err(error) = self.flush(&entries) {
                if let Some(previous) = previous {
                    entries.insert(key.to_owned(), previous);
                }
                return Err(error);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set("auric.cart.guest", r#"{"lines":[]}"#).unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(
            reopened.get("auric.cart.guest").unwrap().as_deref(),
            Some(r#"{"lines":[]}"#)
        );
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/store.json");
        let storage = FileStorage::open(&path).unwrap();
        storage.set("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{broken").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set("k", "v").unwrap();
        storage.remove("k").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap(), None);
    }
}
