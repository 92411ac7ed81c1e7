// Versioned key-value store with optional expiry
//
// Every entry lives under `<prefix>__<version>__<name>`, so two schema
// versions of the same record never see each other. Migration copies data
// from one namespace to the next through a transform.

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::store::backend::{storage_supported, StorageBackend};
use crate::DraftStoreError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// How long a written entry stays readable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    #[default]
    Never,
    After(Duration),
}

impl Expiry {
    fn deadline(self, now_millis: u64) -> Option<u64> {
        match self {
            Expiry::Never => None,
            Expiry::After(ttl) => {
                let ttl_millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
                Some(now_millis.saturating_add(ttl_millis))
            }
        }
    }
}

impl From<Option<Duration>> for Expiry {
    fn from(ttl: Option<Duration>) -> Self {
        ttl.map_or(Expiry::Never, Expiry::After)
    }
}

/// Wrapped value as written to the medium.
///
/// `expires` is epoch milliseconds; `null` means the entry never expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry<T> {
    pub data: T,
    #[serde(rename = "__valid", alias = "valid", default)]
    pub valid: bool,
    #[serde(default)]
    pub expires: Option<u64>,
}

impl<T> StoredEntry<T> {
    pub fn new(data: T, expires: Option<u64>) -> Self {
        Self {
            data,
            valid: true,
            expires,
        }
    }

    /// Valid and not yet past its deadline
    pub fn is_usable(&self, now_millis: u64) -> bool {
        self.valid && self.expires.map_or(true, |deadline| now_millis < deadline)
    }
}

/// Versioned store over a string-keyed medium with a write-through cache
pub struct VersionedStore {
    backend: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
    prefix: String,
    version: u32,
    default_expiry: Expiry,
    cache: HashMap<String, StoredEntry<Value>>,
    persistent: bool,
}

impl VersionedStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_config(backend, StoreConfig::default())
    }

    pub fn with_config(backend: Arc<dyn StorageBackend>, config: StoreConfig) -> Self {
        let persistent = storage_supported(backend.as_ref());
        if !persistent {
            tracing::warn!("Versioned store running memory-only");
        }
        Self {
            backend,
            clock: Arc::new(SystemClock),
            default_expiry: config.default_expiry().into(),
            prefix: config.prefix,
            version: config.version,
            cache: HashMap::new(),
            persistent,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Address a different schema version. Does not migrate anything.
    pub fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    /// Whether writes reach the medium or only the in-memory cache
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    pub fn default_expiry(&self) -> Expiry {
        self.default_expiry
    }

    /// Expiry for every later `set` until changed again
    pub fn set_default_expiry(&mut self, expiry: Expiry) -> &mut Self {
        self.default_expiry = expiry;
        self
    }

    /// One-shot expiry: applies to the single write made through the handle
    pub fn expiring(&mut self, ttl: Duration) -> ExpiringWrite<'_> {
        ExpiringWrite { store: self, ttl }
    }

    pub fn namespaced_key(&self, version: u32, name: &str) -> String {
        format!("{}__{}__{}", self.prefix, version, name)
    }

    /// Read `name` under the current version. Missing, malformed, invalid and
    /// expired entries all read as `None`.
    pub fn get<T: DeserializeOwned>(&mut self, name: &str) -> Option<T> {
        let entry = self.load_entry(self.version, name)?;
        decode(name, entry.data)
    }

    /// Write with the default expiry
    pub fn set<T: Serialize>(&mut self, name: &str, data: &T) -> Result<(), DraftStoreError> {
        self.set_with(name, data, self.default_expiry)
    }

    pub fn set_with<T: Serialize>(
        &mut self,
        name: &str,
        data: &T,
        expiry: Expiry,
    ) -> Result<(), DraftStoreError> {
        let value =
            serde_json::to_value(data).map_err(|e| DraftStoreError::Serialization(e.to_string()))?;
        self.store_entry(self.version, name, value, expiry)
    }

    /// Delete `name` under the current version. Missing keys are fine.
    pub fn remove(&mut self, name: &str) {
        self.remove_entry(self.version, name);
    }

    /// Move `name` from `from` to `to`, rewriting the data with `transform`.
    ///
    /// The transform runs only when a usable entry exists under `from`. The new
    /// entry never expires. The old one is removed after the new one is written.
    /// The store addresses `to` afterwards whether or not anything moved.
    ///
    /// A usable entry that does not decode as `T`, or a transform error, aborts
    /// the migration: nothing is written, `from` keeps its data and the version
    /// is unchanged.
    pub fn migrate<T, U, E, F>(
        &mut self,
        name: &str,
        from: u32,
        to: u32,
        transform: F,
    ) -> Result<Option<U>, DraftStoreError>
    where
        T: DeserializeOwned,
        U: Serialize,
        E: std::fmt::Display,
        F: FnOnce(T) -> Result<U, E>,
    {
        let migrated = match self.load_entry(from, name) {
            Some(entry) => {
                let old: T = serde_json::from_value(entry.data).map_err(|e| {
                    DraftStoreError::Serialization(format!(
                        "'{}' at v{} does not match the migration input: {}",
                        name, from, e
                    ))
                })?;
                let data = transform(old).map_err(|e| DraftStoreError::Migration(e.to_string()))?;
                let value = serde_json::to_value(&data)
                    .map_err(|e| DraftStoreError::Serialization(e.to_string()))?;
                self.store_entry(to, name, value, Expiry::Never)?;
                tracing::info!("Migrated '{}' from v{} to v{}", name, from, to);
                Some(data)
            }
            None => {
                tracing::debug!("Nothing to migrate for '{}' at v{}", name, from);
                None
            }
        };

        if from != to {
            self.remove_entry(from, name);
        }
        self.version = to;
        Ok(migrated)
    }

    /// Flush the medium if it buffers writes
    pub fn flush(&self) -> Result<(), DraftStoreError> {
        if !self.persistent {
            return Ok(());
        }
        self.backend.flush().map_err(DraftStoreError::Storage)
    }

    fn load_entry(&mut self, version: u32, name: &str) -> Option<StoredEntry<Value>> {
        let key = self.namespaced_key(version, name);
        let now = self.clock.now_millis();

        if let Some(entry) = self.cache.get(&key) {
            if entry.is_usable(now) {
                return Some(entry.clone());
            }
            self.cache.remove(&key);
            return None;
        }

        if !self.persistent {
            return None;
        }

        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };

        let entry: StoredEntry<Value> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Ignoring malformed entry at {}: {}", key, e);
                return None;
            }
        };

        if !entry.is_usable(now) {
            return None;
        }

        self.cache.insert(key, entry.clone());
        Some(entry)
    }

    fn store_entry(
        &mut self,
        version: u32,
        name: &str,
        data: Value,
        expiry: Expiry,
    ) -> Result<(), DraftStoreError> {
        let key = self.namespaced_key(version, name);
        let entry = StoredEntry::new(data, expiry.deadline(self.clock.now_millis()));

        if self.persistent {
            let raw = serde_json::to_string(&entry)
                .map_err(|e| DraftStoreError::Serialization(e.to_string()))?;
            if let Err(e) = self.backend.set(&key, &raw) {
                tracing::warn!("Failed to persist {}, keeping it in memory: {}", key, e);
            }
        }

        self.cache.insert(key, entry);
        Ok(())
    }

    fn remove_entry(&mut self, version: u32, name: &str) {
        let key = self.namespaced_key(version, name);
        self.cache.remove(&key);
        if self.persistent {
            if let Err(e) = self.backend.remove(&key) {
                tracing::warn!("Failed to remove {}: {}", key, e);
            }
        }
    }
}

fn decode<T: DeserializeOwned>(name: &str, data: Value) -> Option<T> {
    match serde_json::from_value(data) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("Entry '{}' does not match the requested shape: {}", name, e);
            None
        }
    }
}

/// Write handle carrying a one-shot expiry
pub struct ExpiringWrite<'a> {
    store: &'a mut VersionedStore,
    ttl: Duration,
}

impl ExpiringWrite<'_> {
    pub fn set<T: Serialize>(self, name: &str, data: &T) -> Result<(), DraftStoreError> {
        self.store.set_with(name, data, Expiry::After(self.ttl))
    }
}
