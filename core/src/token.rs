//! Persisted bearer token storage.
//!
//! # Design
//! The client only ever reads the token; `Session` is the one writer. Stores
//! are injected behind `TokenStore` so tests run against `MemoryTokenStore`
//! and devices against `FileTokenStore`.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::error::StorageError;

/// Storage key the token lives under.
pub const TOKEN_KEY: &str = "userToken";

/// Read/write/delete access to the persisted token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// The stored token, or `None` when logged out.
    async fn get(&self) -> Result<Option<String>, StorageError>;

    async fn set(&self, token: &str) -> Result<(), StorageError>;

    async fn delete(&self) -> Result<(), StorageError>;
}

/// In-process store, used in tests and by hosts without persistence.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> Result<Option<String>, StorageError> {
        Ok(self.token.read().await.clone())
    }

    async fn set(&self, token: &str) -> Result<(), StorageError> {
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }

    async fn delete(&self) -> Result<(), StorageError> {
        *self.token.write().await = None;
        Ok(())
    }
}

/// Device-local key/value file holding `userToken` among other keys.
///
/// Writes replace the whole file through a temporary sibling and a rename, so
/// a reader sees either the old or the new contents. Last write wins.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, serde_json::Value>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    async fn store(
        &self,
        entries: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self) -> Result<Option<String>, StorageError> {
        let entries = self.load().await?;
        Ok(entries
            .get(TOKEN_KEY)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string))
    }

    async fn set(&self, token: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(TOKEN_KEY.to_string(), serde_json::Value::from(token));
        self.store(&entries).await
    }

    async fn delete(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.store(&entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get().await.unwrap(), None);
        store.set("abc").await.unwrap();
        assert_eq!(store.get().await.unwrap().as_deref(), Some("abc"));
        store.set("def").await.unwrap();
        assert_eq!(store.get().await.unwrap().as_deref(), Some("def"));
        store.delete().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_missing_file_is_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("storage.json"));
        assert_eq!(store.get().await.unwrap(), None);
        store.delete().await.unwrap();
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        FileTokenStore::new(&path).set("persisted").await.unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.get().await.unwrap().as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn file_store_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"selectedLocation":"l1"}"#).unwrap();

        let store = FileTokenStore::new(&path);
        store.set("t").await.unwrap();
        store.delete().await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"selectedLocation": "l1"}));
    }

    #[tokio::test]
    async fn file_store_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();
        let err = FileTokenStore::new(&path).get().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }
}
