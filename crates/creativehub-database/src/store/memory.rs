//! In-memory creative store using a Tokio mutex.
//!
//! A transaction holds the mutex for its whole lifetime and writes into a
//! staged copy of the tables. Commit swaps the staged copy in; dropping the
//! transaction discards it. Row constraints the PostgreSQL schema enforces
//! (foreign keys, the one-of asset check, unique revision versions) are
//! checked here too, so a bug that the database would reject also fails
//! against this store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use creativehub_core::error::AppError;
use creativehub_core::result::AppResult;
use creativehub_core::types::{
    BatchAssetId, BatchId, CopyId, CopyRevisionId, MerchantId, PromptAssetId, ReferenceAssetId,
};
use creativehub_entity::asset::{
    AssetRef, BatchAssetRow, NewBatchAsset, PromptAsset, PromptAssetType, ReferenceAsset,
    ReferenceKind,
};
use creativehub_entity::batch::{Batch, NewBatch, StatusUpdate};
use creativehub_entity::copy::{
    CopyChanges, CopyRevision, CopyState, CreativeCopy, NewRevision, RevisionSource,
};

use super::{CreativeStore, CreativeTx};

/// A store write that can be made to fail once, for exercising rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    /// `insert_batch`
    InsertBatch,
    /// `insert_batch_assets`
    InsertBatchAssets,
    /// `update_batch_status`
    UpdateBatchStatus,
    /// `update_copy`
    UpdateCopy,
    /// `insert_revision`
    InsertRevision,
    /// `commit`
    Commit,
}

/// Every table the engine touches.
#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    /// `prompt_assets`
    pub prompt_assets: HashMap<PromptAssetId, PromptAsset>,
    /// `reference_assets`
    pub reference_assets: HashMap<ReferenceAssetId, ReferenceAsset>,
    /// `creative_batches`
    pub batches: HashMap<BatchId, Batch>,
    /// `creative_batch_assets`, in insertion order.
    pub batch_assets: Vec<BatchAssetRow>,
    /// `creative_copies`
    pub copies: HashMap<CopyId, CreativeCopy>,
    /// `creative_copy_revisions`, in insertion order.
    pub revisions: Vec<CopyRevision>,
}

impl MemoryTables {
    /// Asset rows of one batch ordered by `sort_order`.
    pub fn assets_of(&self, batch_id: BatchId) -> Vec<BatchAssetRow> {
        let mut rows: Vec<BatchAssetRow> = self
            .batch_assets
            .iter()
            .filter(|r| r.batch_id == batch_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.sort_order);
        rows
    }

    /// Revisions of one copy ordered by version.
    pub fn revisions_of(&self, copy_id: CopyId) -> Vec<CopyRevision> {
        let mut rows: Vec<CopyRevision> = self
            .revisions
            .iter()
            .filter(|r| r.copy_id == copy_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.version);
        rows
    }
}

#[derive(Debug, Default)]
struct InnerState {
    tables: MemoryTables,
    fault: Option<FailurePoint>,
}

/// In-memory creative store.
///
/// Suitable for tests and single-process embedding only.
#[derive(Debug, Clone, Default)]
pub struct MemoryCreativeStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryCreativeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call at `point` fail with a database error.
    pub async fn inject_failure(&self, point: FailurePoint) {
        self.state.lock().await.fault = Some(point);
    }

    /// A copy of every table as last committed.
    pub async fn snapshot(&self) -> MemoryTables {
        self.state.lock().await.tables.clone()
    }

    /// Seed a prompt asset owned by `merchant_id`.
    pub async fn insert_prompt_asset(
        &self,
        merchant_id: MerchantId,
        asset_type: PromptAssetType,
    ) -> PromptAssetId {
        let id = PromptAssetId::new();
        self.state.lock().await.tables.prompt_assets.insert(
            id,
            PromptAsset {
                id,
                merchant_id,
                asset_type,
            },
        );
        id
    }

    /// Seed a reference asset owned by `merchant_id`.
    pub async fn insert_reference_asset(
        &self,
        merchant_id: MerchantId,
        kind: ReferenceKind,
    ) -> ReferenceAssetId {
        let id = ReferenceAssetId::new();
        self.state.lock().await.tables.reference_assets.insert(
            id,
            ReferenceAsset {
                id,
                merchant_id,
                kind,
            },
        );
        id
    }

    /// Insert a copy the way the generation worker does, together with
    /// its version 1 `MODEL` revision.
    pub async fn insert_copy(
        &self,
        batch_id: BatchId,
        sequence: i32,
        content: &str,
    ) -> AppResult<CreativeCopy> {
        self.insert_copy_row(batch_id, sequence, content, None).await
    }

    /// Insert a worker copy that was regenerated from `source`.
    pub async fn insert_regenerated_copy(
        &self,
        batch_id: BatchId,
        sequence: i32,
        content: &str,
        source: CopyId,
    ) -> AppResult<CreativeCopy> {
        self.insert_copy_row(batch_id, sequence, content, Some(source))
            .await
    }

    async fn insert_copy_row(
        &self,
        batch_id: BatchId,
        sequence: i32,
        content: &str,
        regenerated_from_id: Option<CopyId>,
    ) -> AppResult<CreativeCopy> {
        let mut state = self.state.lock().await;
        let tables = &mut state.tables;
        if !tables.batches.contains_key(&batch_id) {
            return Err(AppError::database(format!(
                "Copy references missing batch {batch_id}"
            )));
        }
        if !(1..=5).contains(&sequence) {
            return Err(AppError::database(format!(
                "Copy sequence {sequence} is outside 1..=5"
            )));
        }
        if let Some(source) = regenerated_from_id {
            if !tables.copies.contains_key(&source) {
                return Err(AppError::database(format!(
                    "Copy references missing source copy {source}"
                )));
            }
        }

        let now = Utc::now();
        let copy = CreativeCopy {
            id: CopyId::new(),
            batch_id,
            sequence,
            state: CopyState::Draft,
            markdown_content: content.to_string(),
            user_override: None,
            raw_model_output: None,
            content_version: 1,
            regenerated_from_id,
            edited_by: None,
            edited_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.copies.insert(copy.id, copy.clone());
        tables.revisions.push(CopyRevision {
            id: CopyRevisionId::new(),
            copy_id: copy.id,
            version: 1,
            content: content.to_string(),
            source: RevisionSource::Model,
            note: None,
            created_by: None,
            created_at: now,
        });
        Ok(copy)
    }

    /// Write a batch-asset row as-is, bypassing every row check.
    ///
    /// Used to reproduce rows left behind by older writers.
    pub async fn insert_raw_batch_asset(&self, row: BatchAssetRow) {
        self.state.lock().await.tables.batch_assets.push(row);
    }
}

#[async_trait]
impl CreativeStore for MemoryCreativeStore {
    async fn begin(&self) -> AppResult<Box<dyn CreativeTx>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.tables.clone();
        Ok(Box::new(MemoryCreativeTx { guard, staged }))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

/// One open in-memory transaction.
struct MemoryCreativeTx {
    guard: OwnedMutexGuard<InnerState>,
    staged: MemoryTables,
}

impl MemoryCreativeTx {
    fn trip(&mut self, point: FailurePoint) -> AppResult<()> {
        if self.guard.fault == Some(point) {
            self.guard.fault = None;
            return Err(AppError::database(format!("Injected failure at {point:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl CreativeTx for MemoryCreativeTx {
    async fn find_batch(&mut self, id: BatchId) -> AppResult<Option<Batch>> {
        Ok(self.staged.batches.get(&id).cloned())
    }

    async fn insert_batch(&mut self, batch: &NewBatch) -> AppResult<Batch> {
        self.trip(FailurePoint::InsertBatch)?;

        if let Some(parent_id) = batch.parent_batch_id {
            let same_merchant = self
                .staged
                .batches
                .get(&parent_id)
                .is_some_and(|p| p.merchant_id == batch.merchant_id);
            if !same_merchant {
                return Err(AppError::database(format!(
                    "Parent batch {parent_id} violates the same-merchant foreign key"
                )));
            }
        }

        let now = Utc::now();
        let row = Batch {
            id: BatchId::new(),
            merchant_id: batch.merchant_id,
            parent_batch_id: batch.parent_batch_id,
            triggered_by: batch.triggered_by,
            model_id: batch.model_id.clone(),
            status: batch.status,
            status_version: 0,
            started_at: None,
            completed_at: None,
            error_code: None,
            error_message: None,
            token_usage: None,
            metadata: batch.metadata.clone(),
            created_at: now,
            updated_at: now,
        };
        self.staged.batches.insert(row.id, row.clone());
        Ok(row)
    }

    async fn insert_batch_assets(
        &mut self,
        batch_id: BatchId,
        assets: &[NewBatchAsset],
    ) -> AppResult<Vec<BatchAssetRow>> {
        self.trip(FailurePoint::InsertBatchAssets)?;

        if !self.staged.batches.contains_key(&batch_id) {
            return Err(AppError::database(format!(
                "Batch assets reference missing batch {batch_id}"
            )));
        }

        let now = Utc::now();
        let mut rows = Vec::with_capacity(assets.len());
        for asset in assets {
            let exists = match asset.asset {
                AssetRef::Prompt(id) => self.staged.prompt_assets.contains_key(&id),
                AssetRef::Reference(id) => self.staged.reference_assets.contains_key(&id),
            };
            if !exists {
                return Err(AppError::database(format!(
                    "Batch asset references missing asset {}",
                    asset.asset.asset_id()
                )));
            }
            rows.push(BatchAssetRow {
                id: BatchAssetId::new(),
                batch_id,
                role: asset.role,
                prompt_asset_id: asset.asset.prompt_asset_id(),
                reference_asset_id: asset.asset.reference_asset_id(),
                is_enabled: asset.is_enabled,
                sort_order: asset.sort_order,
                created_at: now,
            });
        }

        self.staged.batch_assets.extend(rows.iter().cloned());
        rows.sort_by_key(|r| r.sort_order);
        debug!(batch_id = %batch_id, count = rows.len(), "Staged batch assets");
        Ok(rows)
    }

    async fn find_batch_assets(&mut self, batch_id: BatchId) -> AppResult<Vec<BatchAssetRow>> {
        Ok(self.staged.assets_of(batch_id))
    }

    async fn update_batch_status(
        &mut self,
        update: &StatusUpdate,
        expected_version: Option<i32>,
    ) -> AppResult<Option<Batch>> {
        self.trip(FailurePoint::UpdateBatchStatus)?;

        let Some(batch) = self.staged.batches.get_mut(&update.batch_id) else {
            return Ok(None);
        };
        if expected_version.is_some_and(|v| v != batch.status_version) {
            return Ok(None);
        }

        batch.status = update.status;
        batch.status_version += 1;
        update.started_at.clone().apply_to(&mut batch.started_at);
        update.completed_at.clone().apply_to(&mut batch.completed_at);
        update.error_code.clone().apply_to(&mut batch.error_code);
        update.error_message.clone().apply_to(&mut batch.error_message);
        update.token_usage.clone().apply_to(&mut batch.token_usage);
        batch.updated_at = Utc::now();
        Ok(Some(batch.clone()))
    }

    async fn find_prompt_assets(
        &mut self,
        merchant_id: MerchantId,
        ids: &[PromptAssetId],
    ) -> AppResult<Vec<PromptAsset>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.staged.prompt_assets.get(id))
            .filter(|a| a.merchant_id == merchant_id)
            .cloned()
            .collect())
    }

    async fn find_reference_assets(
        &mut self,
        merchant_id: MerchantId,
        ids: &[ReferenceAssetId],
    ) -> AppResult<Vec<ReferenceAsset>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.staged.reference_assets.get(id))
            .filter(|a| a.merchant_id == merchant_id)
            .cloned()
            .collect())
    }

    async fn find_copy(&mut self, id: CopyId) -> AppResult<Option<CreativeCopy>> {
        Ok(self.staged.copies.get(&id).cloned())
    }

    async fn find_copy_for_update(&mut self, id: CopyId) -> AppResult<Option<CreativeCopy>> {
        self.find_copy(id).await
    }

    async fn find_copies(&mut self, batch_id: BatchId) -> AppResult<Vec<CreativeCopy>> {
        let mut copies: Vec<CreativeCopy> = self
            .staged
            .copies
            .values()
            .filter(|c| c.batch_id == batch_id)
            .cloned()
            .collect();
        copies.sort_by_key(|c| c.sequence);
        Ok(copies)
    }

    async fn find_regenerations(&mut self, ids: &[CopyId]) -> AppResult<Vec<(CopyId, CopyId)>> {
        let mut children: Vec<&CreativeCopy> = self
            .staged
            .copies
            .values()
            .filter(|c| c.regenerated_from_id.is_some_and(|src| ids.contains(&src)))
            .collect();
        children.sort_by_key(|c| c.created_at);
        Ok(children
            .into_iter()
            .filter_map(|c| c.regenerated_from_id.map(|src| (src, c.id)))
            .collect())
    }

    async fn update_copy(&mut self, id: CopyId, changes: &CopyChanges) -> AppResult<CreativeCopy> {
        self.trip(FailurePoint::UpdateCopy)?;

        let copy = self
            .staged
            .copies
            .get_mut(&id)
            .ok_or_else(|| AppError::database(format!("Copy {id} vanished during update")))?;

        if let Some(content) = &changes.content {
            copy.user_override = Some(content.clone());
            copy.content_version += 1;
            copy.edited_by = Some(changes.editor);
            copy.edited_at = Some(changes.at);
        }
        if let Some(state) = changes.state {
            copy.state = state;
        }
        copy.updated_at = changes.at;
        Ok(copy.clone())
    }

    async fn insert_revision(&mut self, revision: &NewRevision) -> AppResult<CopyRevision> {
        self.trip(FailurePoint::InsertRevision)?;

        if !self.staged.copies.contains_key(&revision.copy_id) {
            return Err(AppError::database(format!(
                "Revision references missing copy {}",
                revision.copy_id
            )));
        }
        let duplicate = self
            .staged
            .revisions
            .iter()
            .any(|r| r.copy_id == revision.copy_id && r.version == revision.version);
        if duplicate {
            return Err(AppError::database(format!(
                "Revision {} already exists for copy {}",
                revision.version, revision.copy_id
            )));
        }

        let row = CopyRevision {
            id: CopyRevisionId::new(),
            copy_id: revision.copy_id,
            version: revision.version,
            content: revision.content.clone(),
            source: revision.source,
            note: revision.note.clone(),
            created_by: revision.created_by,
            created_at: Utc::now(),
        };
        self.staged.revisions.push(row.clone());
        Ok(row)
    }

    async fn find_revisions(&mut self, copy_id: CopyId) -> AppResult<Vec<CopyRevision>> {
        Ok(self.staged.revisions_of(copy_id))
    }

    async fn commit(mut self: Box<Self>) -> AppResult<()> {
        self.trip(FailurePoint::Commit)?;
        let staged = std::mem::take(&mut self.staged);
        self.guard.tables = staged;
        Ok(())
    }
}
