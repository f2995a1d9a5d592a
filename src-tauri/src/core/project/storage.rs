//! Project Storage
//!
//! Key/value blob stores behind the project service. Keys are `/`-separated
//! relative names such as `projects/1719000000000123.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::core::fs::{atomic_write_bytes, resolve_key};
use crate::core::{CoreError, CoreResult};

/// UTF-8 blob store
#[async_trait]
pub trait ProjectStorage: Send + Sync {
    /// Contents stored under `key`, `None` when absent
    async fn read(&self, key: &str) -> CoreResult<Option<String>>;

    /// Replaces the contents under `key`
    async fn write(&self, key: &str, contents: String) -> CoreResult<()>;

    /// Removes `key`. Returns whether it existed.
    async fn delete(&self, key: &str) -> CoreResult<bool>;

    /// Keys directly below `prefix`, sorted
    async fn list(&self, prefix: &str) -> CoreResult<Vec<String>>;
}

// =============================================================================
// File Storage
// =============================================================================

/// Stores each key as a file below a root directory, written atomically.
#[derive(Clone, Debug)]
pub struct FileProjectStorage {
    root: PathBuf,
}

impl FileProjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn is_scratch_file(name: &str) -> bool {
    name.ends_with(".tmp") || name.ends_with(".bak")
}

#[async_trait]
impl ProjectStorage for FileProjectStorage {
    async fn read(&self, key: &str) -> CoreResult<Option<String>> {
        let path = resolve_key(&self.root, key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, contents: String) -> CoreResult<()> {
        let path = resolve_key(&self.root, key)?;
        debug!("Writing {} bytes to {}", contents.len(), path.display());
        tokio::task::spawn_blocking(move || atomic_write_bytes(&path, contents.as_bytes()))
            .await
            .map_err(|e| CoreError::Storage(format!("Write task failed: {}", e)))?
    }

    async fn delete(&self, key: &str) -> CoreResult<bool> {
        let path = resolve_key(&self.root, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> CoreResult<Vec<String>> {
        let dir = resolve_key(&self.root, prefix)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !is_scratch_file(&name) {
                keys.push(format!("{prefix}/{name}"));
            }
        }
        keys.sort();
        Ok(keys)
    }
}

// =============================================================================
// Memory Storage
// =============================================================================

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryProjectStorage {
    blobs: RwLock<BTreeMap<String, String>>,
}

impl MemoryProjectStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStorage for MemoryProjectStorage {
    async fn read(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, contents: String) -> CoreResult<()> {
        self.blobs.write().await.insert(key.to_string(), contents);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CoreResult<bool> {
        Ok(self.blobs.write().await.remove(key).is_some())
    }

    async fn list(&self, prefix: &str) -> CoreResult<Vec<String>> {
        let dir = format!("{prefix}/");
        Ok(self
            .blobs
            .read()
            .await
            .keys()
            .filter(|k| k.strip_prefix(&dir).is_some_and(|rest| !rest.contains('/')))
            .cloned()
            .collect())
    }
}
