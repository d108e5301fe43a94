//! Generated copy domain entities.

pub mod edit;
pub mod model;
pub mod revision;
pub mod state;

pub use edit::CopyEdit;
pub use model::{CopyChanges, CopyProjection, CreativeCopy};
pub use revision::{CopyRevision, NewRevision, RevisionSource};
pub use state::CopyState;
