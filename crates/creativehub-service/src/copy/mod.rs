//! Copy edits, revision history, and regeneration.

pub mod regenerate;
pub mod service;

pub use regenerate::{RegenerationService, RegenerationTicket};
pub use service::{CopyDetail, CopyService};
