//! Typed JSON store on top of a raw key-value backend.

use crate::backend::{KeyValueBackend, MemoryBackend};
use crate::StorageError;
use serde::{de::DeserializeOwned, Serialize};

/// Type-safe store with automatic JSON serialization.
///
/// Any type implementing `Serialize` and `DeserializeOwned` can be stored.
pub struct JsonStore<B: KeyValueBackend = MemoryBackend> {
    backend: B,
}

impl JsonStore<MemoryBackend> {
    /// Open a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }
}

impl<B: KeyValueBackend> JsonStore<B> {
    /// Wrap a backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get a value from the store.
    ///
    /// Returns `None` if the key doesn't exist.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let items: Option<Vec<LineItem>> = store.get("jamjar:cart_items")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.backend.get(key)? {
            Some(bytes) => {
                let value: T = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a value in the store.
    ///
    /// Serialization happens before the backend is touched, so a value
    /// that fails to serialize never clobbers the stored one.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.set(key, &bytes)?;
        tracing::trace!(key, bytes = bytes.len(), "stored value");
        Ok(())
    }

    /// Delete a value from the store.
    pub fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.backend.delete(key)
    }

    /// Check if a key exists in the store.
    pub fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.backend.exists(key)
    }

    /// Borrow the raw backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// Helper to build namespaced storage keys.
///
/// # Example
///
/// ```
/// let key = jam_storage::storage_key!("jamjar", "cart_items");
/// assert_eq!(key, "jamjar:cart_items");
/// ```
#[macro_export]
macro_rules! storage_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}
