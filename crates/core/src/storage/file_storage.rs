use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::{Storage, StorageError, StorageOptions, StorageResult};

/// A file-based storage implementation: one file per key under `base_path`
pub struct FileStorage {
    base_path: PathBuf,
    options: StorageOptions,
    cache: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl FileStorage {
    /// Create a new file storage instance
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = base_path.into();

        if !path.exists() {
            fs::create_dir_all(&path).await?;
        }

        Ok(Self {
            base_path: path,
            options: StorageOptions::default(),
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Set storage options
    pub fn with_options(mut self, options: StorageOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the full path for a key
    fn get_path(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.base_path.clone(), |path, segment| path.join(segment))
    }

    /// Turn a file path under the base directory back into its key
    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_path).ok()?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        Some(segments.join("/"))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn put(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.get_path(key);

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;

        if self.options.sync_write {
            file.sync_all().await?;
        }

        if self.options.use_cache {
            let mut cache = self.cache.write().await;
            cache.insert(key.to_string(), data.to_vec());
        }

        debug!("Stored data at key: {}", key);
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        if self.options.use_cache {
            let cache = self.cache.read().await;
            if let Some(data) = cache.get(key) {
                trace!("Retrieved data from cache for key: {}", key);
                return Ok(data.clone());
            }
        }

        let path = self.get_path(key);
        if !path.is_file() {
            return Err(StorageError::KeyNotFound(key.to_string()));
        }

        let mut file = fs::File::open(&path).await?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).await?;

        if self.options.use_cache {
            let mut cache = self.cache.write().await;
            cache.insert(key.to_string(), data.clone());
        }

        Ok(data)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.get_path(key);
        if !path.is_file() {
            return Err(StorageError::KeyNotFound(key.to_string()));
        }

        fs::remove_file(path).await?;
        if self.options.use_cache {
            let mut cache = self.cache.write().await;
            cache.remove(key);
        }

        debug!("Deleted key: {}", key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        if self.options.use_cache {
            let cache = self.cache.read().await;
            if cache.contains_key(key) {
                return Ok(true);
            }
        }

        Ok(self.get_path(key).is_file())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        debug!("Listing keys with prefix: {}", prefix);

        let mut keys = Vec::new();
        let mut pending = vec![self.base_path.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else if let Some(key) = self.key_for(&path) {
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn base_path(&self) -> Option<PathBuf> {
        Some(self.base_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_storage_round_trip() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).await.unwrap();

        storage.put("vote/items/abc", b"item").await.unwrap();
        storage.put("vote/items/def", b"other").await.unwrap();
        storage.put("governance/schemes/x", b"scheme").await.unwrap();

        assert_eq!(storage.get("vote/items/abc").await.unwrap(), b"item");
        assert!(storage.exists("vote/items/def").await.unwrap());
        assert_eq!(
            storage.list("vote/").await.unwrap(),
            vec!["vote/items/abc".to_string(), "vote/items/def".to_string()]
        );

        storage.delete("vote/items/abc").await.unwrap();
        assert!(matches!(
            storage.get("vote/items/abc").await,
            Err(StorageError::KeyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_file_storage_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let storage = FileStorage::new(dir.path()).await.unwrap();
            storage.put("election/config/dao", b"cfg").await.unwrap();
        }

        let reopened = FileStorage::new(dir.path())
            .await
            .unwrap()
            .with_options(StorageOptions {
                sync_write: false,
                use_cache: false,
            });
        assert_eq!(reopened.get("election/config/dao").await.unwrap(), b"cfg");
        assert_eq!(reopened.base_path(), Some(dir.path().to_path_buf()));
    }
}
