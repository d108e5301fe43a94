//! # creativehub-service
//!
//! The batch and copy engine. Services validate input assets, create
//! batches and their asset rows atomically, apply worker status writes,
//! edit copies with an append-only revision log, and queue regeneration
//! batches.
//!
//! Services follow constructor injection: the store and settings are
//! provided at construction time via `Arc` references.

pub mod access;
pub mod batch;
pub mod context;
pub mod copy;
pub mod error;
pub mod outcome;

pub use access::{AccessGuard, AllowAllAccess, MerchantAccess};
pub use batch::{BatchCopy, BatchDetail, BatchService, CreateBatchRequest, CreatedBatch};
pub use context::RequestContext;
pub use copy::{CopyDetail, CopyService, RegenerationService, RegenerationTicket};
pub use error::{CreativeError, ErrorCategory, MismatchedAsset};
pub use outcome::{completion_update, decide_final_status, failure_update};
