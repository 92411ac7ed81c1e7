// Store module: string-keyed media and the versioned layer on top

pub mod backend;
pub mod versioned;

#[cfg(not(target_arch = "wasm32"))]
pub use backend::SledStorage;
pub use backend::{storage_supported, MemoryStorage, StorageBackend, UnavailableStorage};
pub use versioned::{ExpiringWrite, Expiry, StoredEntry, VersionedStore};
