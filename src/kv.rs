//! Key-value persistence backends.
//!
//! The record store never touches files directly; it reads and writes whole
//! string blobs through [`KeyValueStore`] so tests can swap in memory.
use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use log::{debug, error, info, trace};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use crate::{Result, ServiceLogError};

/// A local string-keyed blob store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the whole value under `key`.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removes the key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Stores each key as `<data_dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `data_dir`, creating the directory if needed.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        if !data_dir.exists() {
            debug!(
                "Data directory does not exist, creating: {}",
                data_dir.display()
            );
            fs::create_dir_all(&data_dir).map_err(|e| {
                error!("Failed to create data directory: {}", e);
                ServiceLogError::DirectoryError {
                    path: data_dir.clone(),
                }
            })?;
        }
        info!("Opened file store at {}", data_dir.display());
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ServiceLogError::InvalidInput {
                message: format!("invalid storage key '{}'", key),
            });
        }
        Ok(self.data_dir.join(format!("{}.json", key)))
    }
}

/// Writes `contents` next to `path` and renames it into place.
fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    trace!("Creating temporary file in directory: {}", dir.display());
    let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        error!("Failed to create temporary file: {}", e);
        ServiceLogError::Io(e)
    })?;

    temp_file.write_all(contents.as_bytes()).map_err(|e| {
        error!("Failed to write to temporary file: {}", e);
        ServiceLogError::Io(e)
    })?;

    temp_file.flush().map_err(|e| {
        error!("Failed to flush temporary file: {}", e);
        ServiceLogError::Io(e)
    })?;

    temp_file.persist(path).map_err(|e| {
        error!("Failed to persist file {}: {}", path.display(), e.error);
        ServiceLogError::Io(e.error)
    })?;

    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                trace!("Read {} bytes from {}", contents.len(), path.display());
                Ok(Some(contents))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                Err(ServiceLogError::Io(e))
            }
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.key_path(key)?;
        debug!("Writing key '{}' to {}", key, path.display());
        tokio::task::spawn_blocking(move || write_atomically(&path, &value))
            .await
            .map_err(|e| ServiceLogError::TaskFailed {
                message: e.to_string(),
            })?
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!("Failed to remove {}: {}", path.display(), e);
                Err(ServiceLogError::Io(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_basics() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "[]".to_string()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("[]"));
        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_persists_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("data")).unwrap();

        assert_eq!(store.get("contacts").await.unwrap(), None);
        store.set("contacts", "[1]".to_string()).await.unwrap();
        store.set("contacts", "[2]".to_string()).await.unwrap();
        assert_eq!(store.get("contacts").await.unwrap().as_deref(), Some("[2]"));
        assert!(dir.path().join("data/contacts.json").exists());

        store.remove("contacts").await.unwrap();
        store.remove("contacts").await.unwrap();
        assert_eq!(store.get("contacts").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.set("../escape", String::new()).await,
            Err(ServiceLogError::InvalidInput { .. })
        ));
    }
}
