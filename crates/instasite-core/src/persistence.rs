//! Best-effort JSON persistence over a storage backend.
//!
//! The [`PersistenceAdapter`] translates typed values to JSON text and back
//! and contains every failure: reads fall back to a caller-supplied value,
//! writes report a success flag. Nothing is retried; the next successful
//! write carries the full state again.
//!
//! An adapter built with [`PersistenceAdapter::unavailable`] models a host
//! without durable storage: every read is a miss and every write fails.

use std::sync::Arc;

use instasite_storage::StorageBackend;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Storage key holding the whole customization aggregate.
pub const STORAGE_KEY_CUSTOMIZATION: &str = "instantWebsiteAi_userCustomization";
/// Reserved for a standalone template selection.
pub const STORAGE_KEY_SELECTED_TEMPLATE: &str = "instantWebsiteAi_selectedTemplate";
/// Reserved for standalone business details.
pub const STORAGE_KEY_BUSINESS_INFO: &str = "instantWebsiteAi_businessInfo";

/// Typed, error-containing access to a key-value backend.
#[derive(Clone)]
pub struct PersistenceAdapter {
    storage: Option<Arc<dyn StorageBackend>>,
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter")
            .field("storage", &self.kind())
            .finish()
    }
}

impl PersistenceAdapter {
    /// Wrap an available storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    /// An adapter with no storage medium behind it.
    #[must_use]
    pub fn unavailable() -> Self {
        Self { storage: None }
    }

    /// Whether a storage medium is present.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    /// Backend kind for logs and health output (`"none"` when unavailable).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.storage.as_ref().map_or("none", |s| s.kind())
    }

    /// Read and decode the value at `key`, or return `fallback`.
    ///
    /// Falls back when the key is absent, storage is unavailable, the read
    /// fails, or the stored text does not decode into `T`.
    pub async fn read_key<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        let Some(storage) = &self.storage else {
            return fallback;
        };

        let bytes = match storage.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return fallback,
            Err(e) => {
                warn!(key, error = %e, "failed to read from storage, using fallback");
                return fallback;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "stored value does not decode, using fallback");
                fallback
            }
        }
    }

    /// Encode `value` as JSON and store it at `key`.
    ///
    /// Returns `false` (after logging) on encoding or storage failure, or
    /// when storage is unavailable.
    pub async fn write_key<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };

        let json = match serde_json::to_vec(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "failed to encode value for storage");
                return false;
            }
        };

        match storage.put(key, &json).await {
            Ok(()) => {
                debug!(key, bytes = json.len(), "value written to storage");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "failed to write to storage");
                false
            }
        }
    }

    /// Remove `key`. Returns whether the removal succeeded.
    pub async fn remove_key(&self, key: &str) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };

        match storage.delete(key).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "failed to remove key from storage");
                false
            }
        }
    }

    /// Remove every key. Returns whether the clear succeeded.
    pub async fn clear_all(&self) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };

        match storage.clear().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to clear storage");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    use instasite_storage::{FileBackend, MemoryBackend, StorageError};
    use serde::Deserialize;

    use super::*;
    use crate::customization::{ColorSlot, CustomizationState};

    /// Backend whose every operation fails while `broken` is set.
    #[derive(Debug, Default)]
    pub(crate) struct FlakyBackend {
        pub(crate) inner: MemoryBackend,
        pub(crate) broken: AtomicBool,
    }

    impl FlakyBackend {
        pub(crate) fn broken() -> Self {
            let backend = Self::default();
            backend.broken.store(true, Ordering::SeqCst);
            backend
        }

        fn check(&self, key: &str) -> Result<(), StorageError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(StorageError::Write {
                    key: key.to_owned(),
                    reason: "quota exceeded".to_owned(),
                });
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl StorageBackend for FlakyBackend {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            self.check(key)?;
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
            self.check(key)?;
            self.inner.put(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.check(key)?;
            self.inner.delete(key).await
        }

        async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
            self.check(prefix)?;
            self.inner.list(prefix).await
        }

        async fn clear(&self) -> Result<(), StorageError> {
            self.check("")?;
            self.inner.clear().await
        }

        fn kind(&self) -> &'static str {
            "flaky"
        }
    }

    fn memory_adapter() -> (PersistenceAdapter, MemoryBackend) {
        let backend = MemoryBackend::new();
        (PersistenceAdapter::new(Arc::new(backend.clone())), backend)
    }

    #[tokio::test]
    async fn write_then_read_returns_equal_value() {
        let (adapter, _) = memory_adapter();
        let mut state = CustomizationState::default();
        state.set_business_name("Acme Bakery");
        state.set_color(ColorSlot::Secondary, "#000000");
        state.set_logo("data:image/png;base64,iVBORw0KGgo=");

        assert!(adapter.write_key(STORAGE_KEY_CUSTOMIZATION, &state).await);
        let read = adapter
            .read_key(STORAGE_KEY_CUSTOMIZATION, CustomizationState::default())
            .await;
        assert_eq!(read, state);
    }

    #[tokio::test]
    async fn roundtrip_of_arbitrary_json_values() {
        let (adapter, _) = memory_adapter();
        let value = serde_json::json!({ "nested": [1, 2.5, null, "x"], "flag": false });
        assert!(adapter.write_key("misc", &value).await);
        let read: serde_json::Value = adapter.read_key("misc", serde_json::Value::Null).await;
        assert_eq!(read, value);
    }

    #[tokio::test]
    async fn missing_key_returns_fallback() {
        let (adapter, _) = memory_adapter();
        let read = adapter.read_key("never-written", 7_u32).await;
        assert_eq!(read, 7);
    }

    #[tokio::test]
    async fn corrupt_text_returns_fallback() {
        let (adapter, backend) = memory_adapter();
        backend
            .put(STORAGE_KEY_CUSTOMIZATION, br#"{"businessName":"Ac"#)
            .await
            .unwrap();

        let fallback = CustomizationState::default();
        let read = adapter
            .read_key(STORAGE_KEY_CUSTOMIZATION, fallback.clone())
            .await;
        assert_eq!(read, fallback);
    }

    #[tokio::test]
    async fn wrong_shape_returns_fallback() {
        let (adapter, backend) = memory_adapter();
        backend
            .put(STORAGE_KEY_CUSTOMIZATION, br#"{"theme":"dark"}"#)
            .await
            .unwrap();

        let read = adapter
            .read_key(STORAGE_KEY_CUSTOMIZATION, CustomizationState::default())
            .await;
        assert_eq!(read, CustomizationState::default());
    }

    #[tokio::test]
    async fn unavailable_storage_misses_and_fails() {
        let adapter = PersistenceAdapter::unavailable();
        assert!(!adapter.is_available());
        assert_eq!(adapter.kind(), "none");
        assert_eq!(adapter.read_key("k", 3_i32).await, 3);
        assert!(!adapter.write_key("k", &1).await);
        assert!(!adapter.remove_key("k").await);
        assert!(!adapter.clear_all().await);
    }

    #[tokio::test]
    async fn storage_failures_are_contained() {
        let backend = Arc::new(FlakyBackend::broken());
        let adapter = PersistenceAdapter::new(backend.clone());

        assert!(!adapter.write_key("k", &"v").await);
        assert_eq!(adapter.read_key("k", "fallback".to_owned()).await, "fallback");
        assert!(!adapter.remove_key("k").await);
        assert!(!adapter.clear_all().await);

        backend.broken.store(false, Ordering::SeqCst);
        assert!(adapter.write_key("k", &"v").await);
        assert_eq!(adapter.read_key("k", String::new()).await, "v");
    }

    #[tokio::test]
    async fn serialization_failure_returns_false() {
        // JSON object keys must be strings.
        let mut map = BTreeMap::new();
        map.insert(vec![1_u8], "value");

        let (adapter, backend) = memory_adapter();
        assert!(!adapter.write_key("bad", &map).await);
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let (adapter, backend) = memory_adapter();
        assert!(adapter.write_key("a", &1).await);
        assert!(adapter.write_key("b", &2).await);

        assert!(adapter.remove_key("a").await);
        assert!(adapter.remove_key("a").await);
        assert_eq!(adapter.read_key("a", 0).await, 0);
        assert_eq!(adapter.read_key("b", 0).await, 2);

        assert!(adapter.clear_all().await);
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn works_over_the_file_backend() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Draft {
            title: String,
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let adapter = PersistenceAdapter::new(Arc::new(FileBackend::new(&path)));
        let draft = Draft {
            title: "Grand opening".to_owned(),
        };
        assert!(adapter.write_key(STORAGE_KEY_BUSINESS_INFO, &draft).await);

        let reopened = PersistenceAdapter::new(Arc::new(FileBackend::new(&path)));
        let read = reopened
            .read_key(
                STORAGE_KEY_BUSINESS_INFO,
                Draft {
                    title: String::new(),
                },
            )
            .await;
        assert_eq!(read, draft);
        assert_eq!(reopened.kind(), "file");
    }
}
