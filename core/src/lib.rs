// Draftkeep Core: unsent message drafts that survive a reload
//
// A versioned, expiring key-value layer over a flat string-keyed medium
// (browser localStorage, sled, or memory), and a drafts collection on top.

pub mod clock;
pub mod config;
pub mod drafts;
pub mod store;

use thiserror::Error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StoreConfig;
pub use drafts::{Draft, DraftStore, DraftSync, DraftTarget, Drafts};
pub use store::{storage_supported, Expiry, MemoryStorage, StorageBackend, VersionedStore};

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftStoreError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Migration failed: {0}")]
    Migration(String),
}

impl From<anyhow::Error> for DraftStoreError {
    fn from(err: anyhow::Error) -> Self {
        DraftStoreError::Storage(err.to_string())
    }
}

/// Install a fmt subscriber honouring `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
