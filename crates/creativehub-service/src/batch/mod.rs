//! Batch creation, validation, and lifecycle.

pub mod composition;
pub mod ownership;
pub mod service;

pub use composition::validate_composition;
pub use ownership::validate_ownership;
pub use service::{BatchCopy, BatchDetail, BatchService, CreateBatchRequest, CreatedBatch};
