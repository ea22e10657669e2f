//! JSON-file storage backend, the on-device default.
//!
//! The whole namespace lives in one JSON object on disk, mapping each key to
//! its value as a UTF-8 string:
//!
//! ```json
//! { "instantWebsiteAi_userCustomization": "{\"businessName\":\"Acme\", ...}" }
//! ```
//!
//! The file is read lazily on first access and cached. Every mutation
//! rewrites the file atomically (temp file + rename) before the cache is
//! updated, so a failed write leaves both disk and cache untouched.
//!
//! A missing file is an empty namespace. A file that does not decode is
//! reported as [`StorageError::Corrupt`] on reads; the next write replaces it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::warn;

use crate::{StorageBackend, StorageError};

type Namespace = BTreeMap<String, String>;

/// A storage backend persisting a flat key-value namespace to a JSON file.
pub struct FileBackend {
    path: PathBuf,
    /// Cached namespace. `None` until the file has been read successfully.
    cache: Mutex<Option<Namespace>>,
}

impl std::fmt::Debug for FileBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl FileBackend {
    /// Create a backend storing its namespace at `path`.
    ///
    /// Nothing touches the filesystem until the first operation; parent
    /// directories are created on the first write.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: Mutex::new(None),
        }
    }

    /// Return the filesystem path of the namespace file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_namespace(&self) -> Result<Namespace, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
                ) =>
            {
                return Ok(Namespace::new());
            }
            Err(e) => {
                return Err(StorageError::Open {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Namespace::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Return the cached namespace, reading the file on first use.
    async fn loaded<'a>(
        &self,
        cache: &'a mut Option<Namespace>,
    ) -> Result<&'a mut Namespace, StorageError> {
        if cache.is_none() {
            *cache = Some(self.read_namespace().await?);
        }
        cache.as_mut().ok_or_else(|| StorageError::Read {
            key: String::new(),
            reason: "namespace cache unexpectedly empty after load".to_owned(),
        })
    }

    /// Namespace to base a mutation on. A corrupt file is replaced rather
    /// than blocking every future write.
    async fn for_update(&self, cache: &mut Option<Namespace>) -> Result<Namespace, StorageError> {
        match self.loaded(cache).await {
            Ok(ns) => Ok(ns.clone()),
            Err(StorageError::Corrupt { path, reason }) => {
                warn!(path = %path, reason = %reason, "replacing corrupt storage file");
                Ok(Namespace::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn write_namespace(&self, ns: &Namespace) -> Result<(), String> {
        let json = serde_json::to_vec_pretty(ns).map_err(|e| e.to_string())?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create '{}': {e}", parent.display()))?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| format!("failed to write '{}': {e}", tmp.display()))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(format!("failed to replace '{}': {e}", self.path.display()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StorageBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let mut cache = self.cache.lock().await;
        let ns = self.loaded(&mut cache).await?;
        Ok(ns.get(key).map(|v| v.clone().into_bytes()))
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let text = std::str::from_utf8(value).map_err(|e| StorageError::Write {
            key: key.to_owned(),
            reason: format!("value is not UTF-8 text: {e}"),
        })?;

        let mut cache = self.cache.lock().await;
        let mut ns = self.for_update(&mut cache).await?;
        ns.insert(key.to_owned(), text.to_owned());

        self.write_namespace(&ns)
            .await
            .map_err(|reason| StorageError::Write {
                key: key.to_owned(),
                reason,
            })?;
        *cache = Some(ns);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut cache = self.cache.lock().await;
        let mut ns = self.for_update(&mut cache).await?;
        if ns.remove(key).is_none() {
            return Ok(());
        }

        self.write_namespace(&ns)
            .await
            .map_err(|reason| StorageError::Delete {
                key: key.to_owned(),
                reason,
            })?;
        *cache = Some(ns);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut cache = self.cache.lock().await;
        let ns = self.loaded(&mut cache).await.map_err(|e| StorageError::List {
            prefix: prefix.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(ns
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut cache = self.cache.lock().await;
        let ns = Namespace::new();
        self.write_namespace(&ns)
            .await
            .map_err(|reason| StorageError::Clear { reason })?;
        *cache = Some(ns);
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "file"
    }
}
