use draftkeep_core::store::{SledStorage, VersionedStore};
use draftkeep_core::{Draft, DraftStore};
use std::sync::Arc;

fn open_drafts(path: &str) -> DraftStore {
    let backend = SledStorage::new(path).unwrap();
    DraftStore::new(VersionedStore::new(Arc::new(backend)), 1)
}

#[test]
fn test_drafts_persist_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_str().unwrap();

    // First instance: add and save a draft
    let id = {
        let mut drafts = open_drafts(path);
        let id = drafts.add_draft(Draft::stream("general", "lunch", "noon?"));
        drafts.flush().unwrap();
        id
    };
    // store dropped here, sled releases its lock

    // Second instance: verify data survived
    {
        let drafts = open_drafts(path);
        assert_eq!(drafts.len(), 1);
        let draft = drafts.get_draft(&id).unwrap();
        assert_eq!(draft.content, "noon?");
        assert!(draft.updated_at.is_some());
    }
}

#[test]
fn test_unsaved_drafts_are_lost_on_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_str().unwrap();

    {
        let mut drafts = open_drafts(path);
        drafts.add_draft(Draft::private("alice@example.com", "never saved"));
    }

    assert!(open_drafts(path).is_empty());
}

#[test]
fn test_delete_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_str().unwrap();

    {
        let mut drafts = open_drafts(path);
        drafts.add_draft(Draft::stream("general", "lunch", "noon?"));
        drafts.flush().unwrap();
        drafts.delete().unwrap();
        drafts.flush().unwrap();
    }

    assert!(open_drafts(path).is_empty());
}
