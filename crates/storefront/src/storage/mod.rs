//! Client-side persistence.
//!
//! Everything the storefront keeps on the device goes through
//! [`Storage`]: the guest cart and wishlist, session tokens, the cached
//! profile, and the pending email-link address. Backends are pluggable
//! via [`StorageBackend`]; [`MemoryStorage`] serves tests and
//! [`FileStorage`](file::FileStorage) serves real deployments.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;

use auric_core::ErrorKind;

pub mod file;

pub use file::FileStorage;

/// Storage keys, namespaced so unrelated tools sharing the same
/// backing store never collide with ours.
pub mod keys {
    /// The guest cart, serialized as JSON.
    pub const GUEST_CART: &str = "auric.cart.guest";

    /// The guest wishlist, serialized as JSON.
    pub const GUEST_WISHLIST: &str = "auric.wishlist.guest";

    /// Email address awaiting magic-link confirmation.
    pub const PENDING_EMAIL: &str = "auric.auth.pending_email";

    /// The access token record for the signed-in customer.
    pub const ACCESS_TOKEN: &str = "auric.auth.access_token";

    /// The refresh token, stored separately from the access token.
    pub const REFRESH_TOKEN: &str = "auric.auth.refresh_token";

    /// Cached customer profile.
    pub const PROFILE: &str = "auric.auth.profile";
}

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend refused the write because it is out of space.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// Underlying I/O failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be serialized or deserialized.
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    /// Machine-readable classification for callers.
    ///
    /// Storage exhaustion and I/O failures are infrastructure faults,
    /// not caller mistakes, so every variant maps to a server error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::ServerError
    }
}

/// A synchronous key-value backend.
///
/// Implementations must be safe to share across tasks. Writes are
/// whole-value: there is no partial update.
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Missing keys are fine.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory backend for tests and ephemeral sessions.
///
/// An optional capacity (total bytes across keys and values) simulates
/// the quota exhaustion a browser storage area or small device imposes.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    capacity: Option<usize>,
}

impl MemoryStorage {
    /// Unbounded in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory storage that rejects writes once `capacity` total
    /// bytes are in use.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: Some(capacity),
        }
    }

    fn usage(entries: &HashMap<String, String>) -> usize {
        entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl StorageBackend for MemoryStorage {
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
        if let Some(capacity) = self.capacity {
            let existing = entries.get(key).map_or(0, String::len);
            let next = Self::usage(&entries) - existing + key.len() + value.len();
            if next > capacity {
                return Err(StorageError::QuotaExceeded);
            }
        }
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Shared handle over a [`StorageBackend`] with JSON conveniences.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn StorageBackend>,
}

impl Storage {
    /// Wrap a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Unbounded in-memory storage, for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Read and deserialize the JSON value under `key`.
    ///
    /// A corrupt value is logged and treated as absent rather than
    /// poisoning every caller downstream of it.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.backend.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                tracing::warn!(key = %key, error = %error, "Discarding corrupt stored value");
                Ok(None)
            }
        }
    }

    /// Serialize `value` as JSON and store it under `key`.
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(key, &raw)
    }

    /// Remove the value under `key`.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.backend.remove(key)
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip() {
        let storage = MemoryStorage::new();
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let storage = MemoryStorage::new();
        assert!(storage.remove("missing").is_ok());
    }

    #[test]
    fn test_capacity_rejects_oversized_write() {
        let storage = MemoryStorage::with_capacity(8);
        storage.set("ab", "cd").unwrap();
        let result = storage.set("ef", "ghijk");
        assert!(matches!(result, Err(StorageError::QuotaExceeded)));
        // The earlier value is untouched.
        assert_eq!(storage.get("ab").unwrap().as_deref(), Some("cd"));
    }

    #[test]
    fn test_capacity_allows_replacing_value() {
        let storage = MemoryStorage::with_capacity(8);
        storage.set("k", "aaaaaaa").unwrap();
        // Replacement frees the old value before counting the new one.
        storage.set("k", "bbbbbbb").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("bbbbbbb"));
    }

    #[test]
    fn test_get_json_discards_corrupt_value() {
        let backend = Arc::new(MemoryStorage::new());
        backend.set(keys::GUEST_CART, "{not json").unwrap();
        let storage = Storage::new(backend);
        let value: Option<serde_json::Value> = storage.get_json(keys::GUEST_CART).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_json_roundtrip() {
        let storage = Storage::in_memory();
        storage
            .set_json(keys::PENDING_EMAIL, &serde_json::json!({"email": "a@b.co"}))
            .unwrap();
        let value: Option<serde_json::Value> = storage.get_json(keys::PENDING_EMAIL).unwrap();
        assert_eq!(value, Some(serde_json::json!({"email": "a@b.co"})));
    }

    #[test]
    fn test_storage_error_kind() {
        assert_eq!(StorageError::QuotaExceeded.kind(), ErrorKind::ServerError);
    }
}
