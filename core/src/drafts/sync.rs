// Keeps the draft of the message being composed in step with the editor
//
// The editor hands over a snapshot of its contents (or `None` when the box is
// empty); this tracks which draft id that snapshot belongs to.

use crate::drafts::draft::Draft;
use crate::drafts::model::DraftStore;
use crate::DraftStoreError;

pub struct DraftSync {
    drafts: DraftStore,
    current: Option<String>,
}

impl DraftSync {
    pub fn new(drafts: DraftStore) -> Self {
        Self {
            drafts,
            current: None,
        }
    }

    /// Id of the draft backing the compose box, if any
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    pub fn drafts_mut(&mut self) -> &mut DraftStore {
        &mut self.drafts
    }

    /// Record the latest editor snapshot.
    ///
    /// A tracked draft is edited, or deleted when the box was emptied. New
    /// content without a tracked draft becomes a draft and is saved at once.
    pub fn update(&mut self, snapshot: Option<Draft>) -> Result<(), DraftStoreError> {
        match (self.current.take(), snapshot) {
            (Some(id), Some(draft)) => {
                if self.drafts.edit_draft(&id, draft.clone()) {
                    self.current = Some(id);
                } else {
                    // deleted elsewhere since we last looked
                    self.start_draft(draft)?;
                }
            }
            (Some(id), None) => {
                self.drafts.delete_draft(&id);
            }
            (None, Some(draft)) => self.start_draft(draft)?,
            (None, None) => {}
        }
        Ok(())
    }

    /// Drop the draft for a message that was just sent
    pub fn finish_after_send(&mut self) -> bool {
        match self.current.take() {
            Some(id) => self.drafts.delete_draft(&id),
            None => false,
        }
    }

    /// Load a stored draft into the compose box. Unknown ids change nothing.
    pub fn restore(&mut self, id: &str) -> Option<Draft> {
        let draft = self.drafts.get_draft(id)?.clone();
        self.current = Some(id.to_string());
        Some(draft)
    }

    /// Final snapshot before the process goes away
    pub fn teardown(&mut self, snapshot: Option<Draft>) -> Result<(), DraftStoreError> {
        self.update(snapshot)?;
        self.drafts.flush()
    }

    fn start_draft(&mut self, draft: Draft) -> Result<(), DraftStoreError> {
        let id = self.drafts.add_draft(draft);
        tracing::debug!("Started draft {}", id);
        self.current = Some(id);
        self.drafts.save()
    }
}
