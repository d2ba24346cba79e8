//! Byte-oriented key/value persistence.
//!
//! Each key maps to one file `<dir>/<key>.json`. Writes go through a sibling
//! temporary file and a rename so a crash never leaves a half-written file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait ByteStore: Send {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl ByteStore for FileStore {
    fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;

        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        std::fs::write(&tmp, bytes).map_err(io_err(&tmp))?;
        std::fs::rename(&tmp, &path).map_err(io_err(&path))?;
        Ok(())
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

/// In-process store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ByteStore for MemoryStore {
    fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .entries
            .lock()
            .ok()
            .and_then(|map| map.get(key).cloned()))
    }

    fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        if let Ok(mut map) = self.entries.lock() {
            map.insert(key.to_string(), bytes.to_vec());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_missing_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.read_bytes("layouts").unwrap().is_none());
    }

    #[test]
    fn file_store_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        store.write_bytes("layouts", b"[]").unwrap();
        assert_eq!(store.read_bytes("layouts").unwrap(), Some(b"[]".to_vec()));
        assert!(dir.path().join("nested").join("layouts.json").exists());
        assert!(!dir.path().join("nested").join(".layouts.json.tmp").exists());
    }

    #[test]
    fn file_store_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.write_bytes("layouts", b"first").unwrap();
        store.write_bytes("layouts", b"second").unwrap();
        assert_eq!(store.read_bytes("layouts").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn file_store_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let store = FileStore::new(&blocker);
        let err = store.write_bytes("layouts", b"[]").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.write_bytes("k", b"v").unwrap();
        assert_eq!(other.read_bytes("k").unwrap(), Some(b"v".to_vec()));
    }
}
