//! Key-value backends for custom field storage
//!
//! A backend only moves opaque strings under string keys. The store above it
//! owns the JSON encoding and the read-modify-persist cycle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tracing::trace;
use ulid::Ulid;

use crate::error::Result;

/// Durable key-value storage abstraction
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Read the value under `key`, `None` if nothing was ever written
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`. Must be durable when this returns.
    async fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local backend, mainly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently holding a value, sorted.
    pub fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<_> = entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory
///
/// ```text
/// custom-fields/
///   customFields_inventory-item.json
///   customFields_supplier.json
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        let path = self.path_for(key);
        atomic_write(&path, value.as_bytes()).await?;
        trace!(path = %path.display(), bytes = value.len(), "wrote custom fields");
        Ok(())
    }
}

/// Write to a temp file then rename for atomic persistence.
async fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent dir"))?;
    let tmp = dir.join(format!(".tmp_{}", Ulid::new()));
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn memory_backend_get_put() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("k").await.unwrap(), None);
        backend.put("k", "[]").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(backend.keys(), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn file_backend_creates_directory_and_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("custom-fields");
        let backend = FileBackend::new(&root);

        assert_eq!(backend.get("customFields_item").await.unwrap(), None);
        backend.put("customFields_item", "[1]").await.unwrap();
        backend.put("customFields_item", "[2]").await.unwrap();

        assert_eq!(
            backend.get("customFields_item").await.unwrap().as_deref(),
            Some("[2]")
        );
        let names: Vec<_> = std::fs::read_dir(&root)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["customFields_item.json".to_string()]);
    }
}
