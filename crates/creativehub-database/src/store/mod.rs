//! Transactional store for batches, batch assets, copies, and revisions.
//!
//! Every engine operation runs inside one [`CreativeTx`]. Writes become
//! visible only on [`CreativeTx::commit`]; dropping a transaction rolls it
//! back. Two backends are provided:
//! - PostgreSQL via sqlx ([`PgCreativeStore`])
//! - In-memory, serialized by a Tokio mutex ([`MemoryCreativeStore`])

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use creativehub_core::result::AppResult;
use creativehub_core::types::{BatchId, CopyId, MerchantId, PromptAssetId, ReferenceAssetId};
use creativehub_entity::asset::{BatchAssetRow, NewBatchAsset, PromptAsset, ReferenceAsset};
use creativehub_entity::batch::{Batch, NewBatch, StatusUpdate};
use creativehub_entity::copy::{CopyChanges, CopyRevision, CreativeCopy, NewRevision};

pub use memory::{FailurePoint, MemoryCreativeStore, MemoryTables};
pub use postgres::PgCreativeStore;

/// Entry point for opening transactions.
#[async_trait]
pub trait CreativeStore: Send + Sync + std::fmt::Debug + 'static {
    /// Open a new transaction.
    async fn begin(&self) -> AppResult<Box<dyn CreativeTx>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// Operations available inside one transaction.
#[async_trait]
pub trait CreativeTx: Send {
    /// Load a batch by id.
    async fn find_batch(&mut self, id: BatchId) -> AppResult<Option<Batch>>;

    /// Insert a batch row. The store assigns the id and timestamps.
    async fn insert_batch(&mut self, batch: &NewBatch) -> AppResult<Batch>;

    /// Insert all asset rows for a batch in one statement.
    async fn insert_batch_assets(
        &mut self,
        batch_id: BatchId,
        assets: &[NewBatchAsset],
    ) -> AppResult<Vec<BatchAssetRow>>;

    /// Load a batch's asset rows ordered by `sort_order`.
    async fn find_batch_assets(&mut self, batch_id: BatchId) -> AppResult<Vec<BatchAssetRow>>;

    /// Apply a worker status write, bumping `status_version` by one.
    ///
    /// With `expected_version`, the write only applies while the stored
    /// version still equals it. Returns `None` when the batch does not
    /// exist or the expected version no longer matches.
    async fn update_batch_status(
        &mut self,
        update: &StatusUpdate,
        expected_version: Option<i32>,
    ) -> AppResult<Option<Batch>>;

    /// Prompt assets among `ids` owned by `merchant_id`, share-locked until the
    /// transaction ends.
    async fn find_prompt_assets(
        &mut self,
        merchant_id: MerchantId,
        ids: &[PromptAssetId],
    ) -> AppResult<Vec<PromptAsset>>;

    /// Reference assets among `ids` owned by `merchant_id`, share-locked until
    /// the transaction ends.
    async fn find_reference_assets(
        &mut self,
        merchant_id: MerchantId,
        ids: &[ReferenceAssetId],
    ) -> AppResult<Vec<ReferenceAsset>>;

    /// Load a copy without locking it.
    async fn find_copy(&mut self, id: CopyId) -> AppResult<Option<CreativeCopy>>;

    /// Load a copy, locking it for the rest of the transaction.
    async fn find_copy_for_update(&mut self, id: CopyId) -> AppResult<Option<CreativeCopy>>;

    /// Load a batch's copies ordered by sequence.
    async fn find_copies(&mut self, batch_id: BatchId) -> AppResult<Vec<CreativeCopy>>;

    /// `(source copy, regenerated copy)` pairs for copies regenerated from any of `ids`.
    async fn find_regenerations(&mut self, ids: &[CopyId]) -> AppResult<Vec<(CopyId, CopyId)>>;

    /// Apply an edit to a copy and return the updated row.
    async fn update_copy(&mut self, id: CopyId, changes: &CopyChanges) -> AppResult<CreativeCopy>;

    /// Append a revision row.
    async fn insert_revision(&mut self, revision: &NewRevision) -> AppResult<CopyRevision>;

    /// Load a copy's revisions ordered by version.
    async fn find_revisions(&mut self, copy_id: CopyId) -> AppResult<Vec<CopyRevision>>;

    /// Make every write in this transaction visible.
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
