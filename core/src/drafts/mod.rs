// Drafts module: unsent compositions kept across reloads

pub mod draft;
pub mod model;
pub mod sync;

pub use draft::{Draft, DraftTarget};
pub use model::{generate_draft_id, DraftStore, Drafts, DRAFTS_KEY};
pub use sync::DraftSync;
