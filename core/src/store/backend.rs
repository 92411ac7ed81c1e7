// Storage abstraction over a flat string-keyed medium
//
// Browser localStorage, sled on native hosts, or plain memory for tests and
// sessions where nothing can be persisted.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Synchronous string-keyed persistence medium
#[cfg_attr(test, mockall::automock)]
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, String>;
    fn set(&self, key: &str, value: &str) -> Result<(), String>;
    fn remove(&self, key: &str) -> Result<(), String>;
    fn flush(&self) -> Result<(), String>;

    /// Whether the medium can be used at all in this environment
    fn is_available(&self) -> bool {
        true
    }
}

static WARNED_UNAVAILABLE: AtomicBool = AtomicBool::new(false);

/// Probe a medium once before relying on it.
///
/// The first failed availability check in the process is logged, later ones stay quiet.
pub fn storage_supported(backend: &dyn StorageBackend) -> bool {
    if backend.is_available() {
        return true;
    }
    if !WARNED_UNAVAILABLE.swap(true, Ordering::Relaxed) {
        tracing::error!("Storage medium is unavailable, drafts will be lost on reload");
    }
    false
}

/// In-memory medium. Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    data: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of raw keys currently held
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Raw value for a key, bypassing any versioning
    pub fn raw(&self, key: &str) -> Option<String> {
        self.data.read().get(key).cloned()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        self.data.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        self.data.write().remove(key);
        Ok(())
    }

    fn flush(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Medium that is never available; every store on top of it runs memory-only.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableStorage;

impl StorageBackend for UnavailableStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, String> {
        Err("storage unavailable".to_string())
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), String> {
        Err("storage unavailable".to_string())
    }

    fn remove(&self, _key: &str) -> Result<(), String> {
        Err("storage unavailable".to_string())
    }

    fn flush(&self) -> Result<(), String> {
        Err("storage unavailable".to_string())
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub struct SledStorage {
    db: sled::Db,
}

#[cfg(not(target_arch = "wasm32"))]
impl SledStorage {
    pub fn new(path: &str) -> std::result::Result<Self, String> {
        let db = sled::open(path).map_err(|e| e.to_string())?;
        Ok(Self { db })
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl StorageBackend for SledStorage {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        let value = self.db.get(key.as_bytes()).map_err(|e| e.to_string())?;
        match value {
            Some(ivec) => String::from_utf8(ivec.to_vec())
                .map(Some)
                .map_err(|e| e.to_string()),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        self.db.remove(key.as_bytes()).map_err(|e| e.to_string())?;
        Ok(())
    }

    fn flush(&self) -> Result<(), String> {
        self.db.flush().map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_shared_between_clones() {
        let a = MemoryStorage::new();
        let b = a.clone();
        a.set("k", "v").unwrap();
        assert_eq!(b.get("k").unwrap(), Some("v".to_string()));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_memory_storage_remove_is_idempotent() {
        let storage = MemoryStorage::new();
        storage.set("k", "v").unwrap();
        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_unavailable_storage_check() {
        assert!(!storage_supported(&UnavailableStorage));
        // second check stays false without panicking or re-warning
        assert!(!storage_supported(&UnavailableStorage));
        assert!(storage_supported(&MemoryStorage::new()));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_sled_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SledStorage::new(dir.path().to_str().unwrap()).unwrap();
        storage.set("ls__1__drafts", "{}").unwrap();
        assert_eq!(
            storage.get("ls__1__drafts").unwrap(),
            Some("{}".to_string())
        );
        storage.remove("ls__1__drafts").unwrap();
        assert_eq!(storage.get("ls__1__drafts").unwrap(), None);
        storage.flush().unwrap();
    }
}
