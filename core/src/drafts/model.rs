// Draft collection persisted as one versioned record
//
// Mutations stay in memory until `save` (or `delete`) writes the whole map
// back under the "drafts" key.

use crate::drafts::draft::Draft;
use crate::store::VersionedStore;
use crate::DraftStoreError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Logical name of the drafts record
pub const DRAFTS_KEY: &str = "drafts";

/// Draft id → draft
pub type Drafts = BTreeMap<String, Draft>;

/// `hex(now_millis)-hex(random)`; unique in practice, not guaranteed
pub fn generate_draft_id(now_millis: u64) -> String {
    // 52 random bits, the precision of a float fraction
    let fraction = rand::random::<u64>() >> 12;
    format!("{:x}-{:x}", now_millis, fraction)
}

pub struct DraftStore {
    store: VersionedStore,
    drafts: Drafts,
}

impl DraftStore {
    /// Open the drafts record at `version`
    pub fn new(mut store: VersionedStore, version: u32) -> Self {
        store.set_version(version);
        Self::from_store(store)
    }

    /// Open the drafts record at whatever version `store` addresses
    pub fn from_store(mut store: VersionedStore) -> Self {
        let drafts = load_drafts(&mut store);
        tracing::debug!(
            "Loaded {} draft(s) at v{}",
            drafts.len(),
            store.version()
        );
        Self { store, drafts }
    }

    /// Add a draft and return its new id. Not persisted until `save`.
    pub fn add_draft(&mut self, mut draft: Draft) -> String {
        let now = self.store.now_millis();
        let mut id = generate_draft_id(now);
        while self.drafts.contains_key(&id) {
            id = generate_draft_id(now);
        }
        draft.updated_at = Some(now);
        self.drafts.insert(id.clone(), draft);
        id
    }

    /// Replace an existing draft. Unknown ids are ignored.
    pub fn edit_draft(&mut self, id: &str, mut draft: Draft) -> bool {
        let now = self.store.now_millis();
        match self.drafts.get_mut(id) {
            Some(slot) => {
                draft.updated_at = Some(now);
                *slot = draft;
                true
            }
            None => false,
        }
    }

    /// Remove a draft. Unknown ids are ignored.
    pub fn delete_draft(&mut self, id: &str) -> bool {
        self.drafts.remove(id).is_some()
    }

    /// The live collection
    pub fn get(&self) -> &Drafts {
        &self.drafts
    }

    pub fn get_draft(&self, id: &str) -> Option<&Draft> {
        self.drafts.get(id)
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Persist the whole collection
    pub fn save(&mut self) -> Result<(), DraftStoreError> {
        self.store.set(DRAFTS_KEY, &self.drafts)
    }

    /// Drop every draft and persist the empty collection
    pub fn delete(&mut self) -> Result<(), DraftStoreError> {
        self.drafts = Drafts::new();
        self.save()
    }

    /// Save and flush the medium, for use before the process goes away
    pub fn flush(&mut self) -> Result<(), DraftStoreError> {
        self.save()?;
        self.store.flush()
    }

    /// Move the record from `from` to `to`, converting the old schema with
    /// `transform`. The collection is empty if nothing usable was stored.
    ///
    /// On error the in-memory collection, the stored record and the version
    /// are all left as they were.
    pub fn migrate<T, E, F>(&mut self, from: u32, to: u32, transform: F) -> Result<&Drafts, DraftStoreError>
    where
        T: DeserializeOwned,
        E: std::fmt::Display,
        F: FnOnce(T) -> Result<Drafts, E>,
    {
        let migrated = self.store.migrate(DRAFTS_KEY, from, to, transform)?;
        self.drafts = migrated.unwrap_or_default();
        Ok(&self.drafts)
    }

    pub fn version(&self) -> u32 {
        self.store.version()
    }

    /// Address another version and reload the collection from it
    pub fn set_version(&mut self, version: u32) {
        self.store.set_version(version);
        self.drafts = load_drafts(&mut self.store);
    }

    pub fn store(&self) -> &VersionedStore {
        &self.store
    }

    pub fn into_store(self) -> VersionedStore {
        self.store
    }
}

/// Read the collection, skipping individual drafts that no longer parse
fn load_drafts(store: &mut VersionedStore) -> Drafts {
    let raw: BTreeMap<String, Value> = store.get(DRAFTS_KEY).unwrap_or_default();
    raw.into_iter()
        .filter_map(|(id, value)| match serde_json::from_value::<Draft>(value) {
            Ok(draft) => Some((id, draft)),
            Err(e) => {
                tracing::warn!("Dropping unreadable draft {}: {}", id, e);
                None
            }
        })
        .collect()
}
