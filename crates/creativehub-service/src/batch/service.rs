//! Batch lifecycle: creation, worker status writes, and detail reads.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use creativehub_core::config::CreativeConfig;
use creativehub_core::types::{BatchId, CopyId, MerchantId, UserId};
use creativehub_database::{CreativeStore, CreativeTx};
use creativehub_entity::asset::{BatchAsset, BatchAssetInput, BatchAssetRow, NewBatchAsset};
use creativehub_entity::batch::{Batch, BatchStatus, BatchSummary, NewBatch, StatusUpdate};
use creativehub_entity::copy::CreativeCopy;

use super::composition::validate_composition;
use super::ownership::validate_ownership;
use crate::error::CreativeError;

/// Input for [`BatchService::create_batch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchRequest {
    /// Owning merchant.
    pub merchant_id: MerchantId,
    /// Requesting user.
    pub triggered_by: UserId,
    /// Input assets, in caller order.
    pub assets: Vec<BatchAssetInput>,
    /// Batch this one derives from.
    #[serde(default)]
    pub parent_batch_id: Option<BatchId>,
    /// Model override; falls back to the configured default.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Initial status; defaults to `QUEUED`.
    #[serde(default)]
    pub status: Option<BatchStatus>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl CreateBatchRequest {
    /// A request with no parent, model override, or metadata.
    pub fn new(merchant_id: MerchantId, triggered_by: UserId, assets: Vec<BatchAssetInput>) -> Self {
        Self {
            merchant_id,
            triggered_by,
            assets,
            parent_batch_id: None,
            model_id: None,
            status: None,
            metadata: None,
        }
    }

    /// Set the parent batch.
    pub fn with_parent(mut self, parent_batch_id: BatchId) -> Self {
        self.parent_batch_id = Some(parent_batch_id);
        self
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Set the metadata blob.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A freshly created batch with its asset rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBatch {
    /// The batch row.
    pub batch: Batch,
    /// Asset associations ordered by sort order.
    pub assets: Vec<BatchAsset>,
    /// Parent batch projection, when a parent was given.
    pub parent_batch: Option<BatchSummary>,
}

/// A copy listed under its batch, with the copies regenerated from it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCopy {
    /// The copy row.
    #[serde(flatten)]
    pub copy: CreativeCopy,
    /// Copies whose `regenerated_from_id` points at this one, oldest first.
    pub regeneration_ids: Vec<CopyId>,
}

/// Everything known about one batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDetail {
    /// The batch row.
    pub batch: Batch,
    /// Parent batch projection.
    pub parent_batch: Option<BatchSummary>,
    /// Asset associations ordered by sort order.
    pub assets: Vec<BatchAsset>,
    /// Copies ordered by sequence.
    pub copies: Vec<BatchCopy>,
}

/// Creates batches and applies worker status writes.
#[derive(Debug, Clone)]
pub struct BatchService {
    /// Transactional store.
    store: Arc<dyn CreativeStore>,
    /// Engine settings.
    config: CreativeConfig,
}

impl BatchService {
    /// Creates a new batch service.
    pub fn new(store: Arc<dyn CreativeStore>, config: CreativeConfig) -> Self {
        Self { store, config }
    }

    /// Engine settings in use.
    pub fn config(&self) -> &CreativeConfig {
        &self.config
    }

    /// Create a batch and its asset associations in one transaction.
    ///
    /// Structural checks run before the transaction opens. Inside it the
    /// parent batch and asset ownership are checked against the same
    /// snapshot the rows are written to; any failure leaves no rows behind.
    pub async fn create_batch(
        &self,
        request: CreateBatchRequest,
    ) -> Result<CreatedBatch, CreativeError> {
        validate_composition(&request.assets)?;

        let merchant_id = request.merchant_id;
        let rows: Vec<NewBatchAsset> = request
            .assets
            .iter()
            .enumerate()
            .map(|(index, input)| NewBatchAsset::from_input(input, index))
            .collect();

        let mut tx = self.store.begin().await?;

        let parent_batch = match request.parent_batch_id {
            Some(parent_id) => Some(load_parent(tx.as_mut(), parent_id, merchant_id).await?),
            None => None,
        };

        validate_ownership(tx.as_mut(), merchant_id, &rows).await?;

        let batch = tx
            .insert_batch(&NewBatch {
                merchant_id,
                parent_batch_id: request.parent_batch_id,
                triggered_by: request.triggered_by,
                model_id: request
                    .model_id
                    .or_else(|| self.config.default_model_id.clone()),
                status: request.status.unwrap_or_default(),
                metadata: request.metadata,
            })
            .await?;
        debug!(batch_id = %batch.id, "Inserted batch row");

        let inserted = tx.insert_batch_assets(batch.id, &rows).await?;
        let assets = resolve_assets(inserted)?;

        tx.commit().await?;

        info!(
            batch_id = %batch.id,
            merchant_id = %merchant_id,
            parent_batch_id = ?batch.parent_batch_id,
            assets = assets.len(),
            "Batch created"
        );

        Ok(CreatedBatch {
            batch,
            assets,
            parent_batch,
        })
    }

    /// Apply a worker status write.
    ///
    /// Always bumps `status_version` by one, even when only the token
    /// accounting changes.
    pub async fn update_batch_status(&self, update: &StatusUpdate) -> Result<Batch, CreativeError> {
        let mut tx = self.store.begin().await?;
        let batch = tx
            .update_batch_status(update, None)
            .await?
            .ok_or(CreativeError::BatchNotFound(update.batch_id))?;
        tx.commit().await?;

        info!(
            batch_id = %batch.id,
            status = %batch.status,
            status_version = batch.status_version,
            "Batch status updated"
        );
        Ok(batch)
    }

    /// Apply a worker status write only if `status_version` still equals
    /// `expected_version`.
    ///
    /// Returns `Ok(None)` when another writer got there first.
    pub async fn update_batch_status_if(
        &self,
        update: &StatusUpdate,
        expected_version: i32,
    ) -> Result<Option<Batch>, CreativeError> {
        let mut tx = self.store.begin().await?;
        if tx.find_batch(update.batch_id).await?.is_none() {
            return Err(CreativeError::BatchNotFound(update.batch_id));
        }

        let Some(batch) = tx.update_batch_status(update, Some(expected_version)).await? else {
            warn!(
                batch_id = %update.batch_id,
                expected_version,
                "Batch status write lost a race"
            );
            return Ok(None);
        };
        tx.commit().await?;

        info!(
            batch_id = %batch.id,
            status = %batch.status,
            status_version = batch.status_version,
            "Batch status updated"
        );
        Ok(Some(batch))
    }

    /// Load a batch with its parent, assets, and copies.
    pub async fn get_batch_detail(&self, batch_id: BatchId) -> Result<BatchDetail, CreativeError> {
        let mut tx = self.store.begin().await?;
        let batch = tx
            .find_batch(batch_id)
            .await?
            .ok_or(CreativeError::BatchNotFound(batch_id))?;

        let parent_batch = match batch.parent_batch_id {
            Some(parent_id) => tx.find_batch(parent_id).await?.map(|p| p.summary()),
            None => None,
        };

        let assets = resolve_assets(tx.find_batch_assets(batch_id).await?)?;

        let copies = tx.find_copies(batch_id).await?;
        let ids: Vec<CopyId> = copies.iter().map(|c| c.id).collect();
        let regenerations = if ids.is_empty() {
            Vec::new()
        } else {
            tx.find_regenerations(&ids).await?
        };
        tx.commit().await?;

        let copies = copies
            .into_iter()
            .map(|copy| {
                let regeneration_ids = regenerations
                    .iter()
                    .filter(|(source, _)| *source == copy.id)
                    .map(|(_, child)| *child)
                    .collect();
                BatchCopy {
                    copy,
                    regeneration_ids,
                }
            })
            .collect();

        Ok(BatchDetail {
            batch,
            parent_batch,
            assets,
            copies,
        })
    }
}

/// Load a parent batch and check it belongs to `merchant_id`.
async fn load_parent(
    tx: &mut dyn CreativeTx,
    parent_id: BatchId,
    merchant_id: MerchantId,
) -> Result<BatchSummary, CreativeError> {
    let Some(parent) = tx.find_batch(parent_id).await? else {
        warn!(parent_batch_id = %parent_id, "Parent batch not found");
        return Err(CreativeError::ParentBatchNotFound(parent_id));
    };
    if parent.merchant_id != merchant_id {
        warn!(
            parent_batch_id = %parent_id,
            merchant_id = %merchant_id,
            "Parent batch belongs to another merchant"
        );
        return Err(CreativeError::ParentBatchMerchantMismatch {
            parent: parent_id,
            merchant: merchant_id,
        });
    }
    Ok(parent.summary())
}

/// Resolve stored rows into typed associations, failing on the first
/// row that does not reference exactly one asset of its role's store.
pub(crate) fn resolve_assets(rows: Vec<BatchAssetRow>) -> Result<Vec<BatchAsset>, CreativeError> {
    rows.into_iter()
        .map(|row| {
            let batch_asset_id = row.id;
            row.into_asset().ok_or_else(|| {
                warn!(batch_asset_id = %batch_asset_id, "Corrupt batch asset row");
                CreativeError::CorruptBatchAsset { batch_asset_id }
            })
        })
        .collect()
}
