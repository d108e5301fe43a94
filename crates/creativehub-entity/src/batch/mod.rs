//! Generation batch domain entities.

pub mod model;
pub mod status;
pub mod update;

pub use model::{Batch, BatchSummary, NewBatch};
pub use status::BatchStatus;
pub use update::StatusUpdate;
