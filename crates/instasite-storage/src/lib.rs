//! Storage backend abstraction for Instasite.
//!
//! This crate defines the [`StorageBackend`] trait, a flat key-value storage
//! interface that knows nothing about customizations, templates, or JSON
//! shapes. The persistence adapter in `instasite-core` wraps a backend and
//! owns (de)serialization and error containment.
//!
//! Three implementations are provided:
//!
//! - [`FileBackend`]: the on-device default, one JSON document on disk
//! - [`RedbBackend`]: embedded pure-Rust database (feature `redb-backend`)
//! - [`MemoryBackend`]: in-memory, for tests and session-only runs

mod error;
mod file;
mod memory;
#[cfg(feature = "redb-backend")]
mod redb_backend;

pub use error::StorageError;
pub use file::FileBackend;
pub use memory::MemoryBackend;
#[cfg(feature = "redb-backend")]
pub use redb_backend::RedbBackend;

/// A pluggable key-value storage backend.
///
/// Keys are arbitrary UTF-8 strings (e.g. `instantWebsiteAi_userCustomization`).
/// Values are opaque byte arrays; the persistence adapter stores JSON text.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Retrieve a value by key.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] or [`StorageError::Corrupt`] if the
    /// underlying medium fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store a key-value pair, overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying medium fails.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Deleting a non-existent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Delete`] if the underlying medium fails.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// List all keys that start with the given prefix, in sorted order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::List`] if the underlying medium fails.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Remove every key in the namespace.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Clear`] if the underlying medium fails.
    async fn clear(&self) -> Result<(), StorageError>;

    /// Check whether a key exists in storage.
    ///
    /// The default implementation calls [`get`](StorageBackend::get) and checks
    /// for `Some`. Backends may override this with a cheaper check.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying medium fails.
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Short human-readable name of the backend kind, used in logs and health output.
    fn kind(&self) -> &'static str;
}
