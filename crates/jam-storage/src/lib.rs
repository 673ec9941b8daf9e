//! Durable key-value storage for the jamjar cart.
//!
//! The cart needs what a browser's local storage offers: a synchronous,
//! per-profile key-value store with no transactions. This crate provides
//! that contract as [`KeyValueBackend`] with three implementations:
//!
//! - [`MemoryBackend`] for tests and ephemeral sessions (optional quota)
//! - [`FileBackend`] for native processes (one JSON file per key)
//! - `SpinBackend` on `wasm32`, backed by Spin's Key-Value Store
//!
//! [`JsonStore`] layers automatic JSON serialization on top.
//!
//! # Example
//!
//! ```rust,ignore
//! use jam_storage::{FileBackend, JsonStore};
//!
//! let store = JsonStore::new(FileBackend::open("/var/lib/jamjar")?);
//! store.set("jamjar:cart_items", &items)?;
//! let items: Option<Vec<LineItem>> = store.get("jamjar:cart_items")?;
//! ```

mod backend;
mod error;
mod kv;

#[cfg(target_arch = "wasm32")]
pub use backend::SpinBackend;
pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use error::StorageError;
pub use kv::JsonStore;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{FileBackend, JsonStore, KeyValueBackend, MemoryBackend, StorageError};
}
