//! Follow-up batches that regenerate a whole batch or a single copy.
//!
//! Both paths rebuild the source batch's asset list and hand it to
//! [`BatchService::create_batch`] with the source as parent. No copy rows
//! are written here; the worker produces them for the new batch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use creativehub_core::types::{BatchId, CopyId};
use creativehub_database::CreativeStore;
use creativehub_entity::asset::{BatchAssetInput, BatchAssetRow};
use creativehub_entity::batch::BatchStatus;
use creativehub_entity::regeneration::{RegenerationMetadata, RegenerationRequest};

use crate::batch::service::{BatchService, CreateBatchRequest, CreatedBatch, resolve_assets};
use crate::context::RequestContext;
use crate::error::CreativeError;

/// Result of queuing a single-copy regeneration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationTicket {
    /// The new batch the worker will pick up.
    pub new_batch_id: BatchId,
    /// The copy being regenerated.
    pub parent_copy_id: CopyId,
    /// The only sequence the new batch will produce.
    pub target_sequence: i32,
    /// Status of the new batch.
    pub status: BatchStatus,
    /// When the new batch was created.
    pub created_at: DateTime<Utc>,
    /// Extra prompt text forwarded to the worker.
    pub append_prompt: Option<String>,
}

/// Builds regeneration batches from existing batches and copies.
#[derive(Debug, Clone)]
pub struct RegenerationService {
    /// Transactional store.
    store: Arc<dyn CreativeStore>,
    /// Batch creation path.
    batches: BatchService,
}

impl RegenerationService {
    /// Creates a new regeneration service.
    pub fn new(store: Arc<dyn CreativeStore>, batches: BatchService) -> Self {
        Self { store, batches }
    }

    /// Queue a batch that regenerates only `copy_id`'s sequence.
    ///
    /// The new batch reuses the source batch's assets, names the source
    /// batch as parent, and carries [`RegenerationMetadata`] so the worker
    /// produces a single copy.
    pub async fn regenerate_single_copy(
        &self,
        ctx: &RequestContext,
        copy_id: CopyId,
        request: RegenerationRequest,
    ) -> Result<RegenerationTicket, CreativeError> {
        let mut tx = self.store.begin().await?;
        let copy = tx
            .find_copy(copy_id)
            .await?
            .ok_or(CreativeError::CopyNotFound(copy_id))?;
        let source = tx
            .find_batch(copy.batch_id)
            .await?
            .ok_or(CreativeError::CopyNotFound(copy_id))?;
        let assets = rebuild_assets(tx.find_batch_assets(source.id).await?)?;
        tx.commit().await?;

        let append_prompt = request.append_prompt.clone();
        let metadata = RegenerationMetadata::new(copy.id, copy.sequence, request);
        let created = self
            .batches
            .create_batch(
                CreateBatchRequest::new(source.merchant_id, ctx.user_id, assets)
                    .with_parent(source.id)
                    .with_metadata(metadata.to_value()),
            )
            .await?;

        info!(
            user_id = %ctx.user_id,
            copy_id = %copy_id,
            new_batch_id = %created.batch.id,
            target_sequence = copy.sequence,
            "Single copy regeneration queued"
        );

        Ok(RegenerationTicket {
            new_batch_id: created.batch.id,
            parent_copy_id: copy.id,
            target_sequence: copy.sequence,
            status: created.batch.status,
            created_at: created.batch.created_at,
            append_prompt,
        })
    }

    /// Queue a batch that regenerates every copy of `batch_id` from the
    /// same assets and model.
    pub async fn regenerate_batch(
        &self,
        ctx: &RequestContext,
        batch_id: BatchId,
    ) -> Result<CreatedBatch, CreativeError> {
        let mut tx = self.store.begin().await?;
        let source = tx
            .find_batch(batch_id)
            .await?
            .ok_or(CreativeError::BatchNotFound(batch_id))?;
        let assets = rebuild_assets(tx.find_batch_assets(batch_id).await?)?;
        tx.commit().await?;

        let mut request = CreateBatchRequest::new(source.merchant_id, ctx.user_id, assets)
            .with_parent(source.id);
        request.model_id = source.model_id;
        let created = self.batches.create_batch(request).await?;

        info!(
            user_id = %ctx.user_id,
            batch_id = %batch_id,
            new_batch_id = %created.batch.id,
            "Batch regeneration queued"
        );
        Ok(created)
    }
}

/// Turn stored rows back into the input list that would recreate them,
/// keeping each row's enabled flag and sort order.
fn rebuild_assets(rows: Vec<BatchAssetRow>) -> Result<Vec<BatchAssetInput>, CreativeError> {
    Ok(resolve_assets(rows)?
        .iter()
        .map(|asset| asset.to_input())
        .collect())
}
