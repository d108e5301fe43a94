//! PostgreSQL implementation of the creative store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use creativehub_core::error::{AppError, ErrorKind};
use creativehub_core::result::AppResult;
use creativehub_core::types::{
    BatchAssetId, BatchId, CopyId, CopyRevisionId, MerchantId, PromptAssetId, ReferenceAssetId,
};
use creativehub_entity::asset::{BatchAssetRow, NewBatchAsset, PromptAsset, ReferenceAsset};
use creativehub_entity::batch::{Batch, NewBatch, StatusUpdate};
use creativehub_entity::copy::{CopyChanges, CopyRevision, CreativeCopy, NewRevision};

use super::{CreativeStore, CreativeTx};

/// Creative store backed by a sqlx PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgCreativeStore {
    pool: PgPool,
}

impl PgCreativeStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreativeStore for PgCreativeStore {
    async fn begin(&self) -> AppResult<Box<dyn CreativeTx>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;
        Ok(Box::new(PgCreativeTx { tx }))
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| db_error("Health check failed", e))
    }
}

/// One open PostgreSQL transaction. Dropped without commit, sqlx rolls it back.
struct PgCreativeTx {
    tx: Transaction<'static, Postgres>,
}

fn db_error(message: &str, err: sqlx::Error) -> AppError {
    AppError::with_source(ErrorKind::Database, message.to_string(), err)
}

#[async_trait]
impl CreativeTx for PgCreativeTx {
    async fn find_batch(&mut self, id: BatchId) -> AppResult<Option<Batch>> {
        sqlx::query_as::<_, Batch>("SELECT * FROM creative_batches WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to find batch", e))
    }

    async fn insert_batch(&mut self, batch: &NewBatch) -> AppResult<Batch> {
        sqlx::query_as::<_, Batch>(
            "INSERT INTO creative_batches \
             (id, merchant_id, parent_batch_id, triggered_by, model_id, status, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(BatchId::new())
        .bind(batch.merchant_id)
        .bind(batch.parent_batch_id)
        .bind(batch.triggered_by)
        .bind(&batch.model_id)
        .bind(batch.status)
        .bind(&batch.metadata)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to insert batch", e))
    }

    async fn insert_batch_assets(
        &mut self,
        batch_id: BatchId,
        assets: &[NewBatchAsset],
    ) -> AppResult<Vec<BatchAssetRow>> {
        let ids: Vec<Uuid> = assets.iter().map(|_| BatchAssetId::new().into_uuid()).collect();
        let roles: Vec<String> = assets.iter().map(|a| a.role.as_str().to_string()).collect();
        let prompt_ids: Vec<Option<Uuid>> = assets
            .iter()
            .map(|a| a.asset.prompt_asset_id().map(PromptAssetId::into_uuid))
            .collect();
        let reference_ids: Vec<Option<Uuid>> = assets
            .iter()
            .map(|a| a.asset.reference_asset_id().map(ReferenceAssetId::into_uuid))
            .collect();
        let enabled: Vec<bool> = assets.iter().map(|a| a.is_enabled).collect();
        let sort_orders: Vec<i32> = assets.iter().map(|a| a.sort_order).collect();

        let mut rows = sqlx::query_as::<_, BatchAssetRow>(
            "INSERT INTO creative_batch_assets \
             (id, batch_id, role, prompt_asset_id, reference_asset_id, is_enabled, sort_order) \
             SELECT u.id, $1, u.role::creative_asset_role, u.prompt_asset_id, u.reference_asset_id, \
                    u.is_enabled, u.sort_order \
             FROM UNNEST($2::uuid[], $3::text[], $4::uuid[], $5::uuid[], $6::bool[], $7::int4[]) \
                  AS u(id, role, prompt_asset_id, reference_asset_id, is_enabled, sort_order) \
             RETURNING *",
        )
        .bind(batch_id)
        .bind(&ids)
        .bind(&roles)
        .bind(&prompt_ids)
        .bind(&reference_ids)
        .bind(&enabled)
        .bind(&sort_orders)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to insert batch assets", e))?;

        rows.sort_by_key(|r| r.sort_order);
        debug!(batch_id = %batch_id, count = rows.len(), "Inserted batch assets");
        Ok(rows)
    }

    async fn find_batch_assets(&mut self, batch_id: BatchId) -> AppResult<Vec<BatchAssetRow>> {
        sqlx::query_as::<_, BatchAssetRow>(
            "SELECT * FROM creative_batch_assets WHERE batch_id = $1 ORDER BY sort_order ASC, created_at ASC",
        )
        .bind(batch_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to load batch assets", e))
    }

    async fn update_batch_status(
        &mut self,
        update: &StatusUpdate,
        expected_version: Option<i32>,
    ) -> AppResult<Option<Batch>> {
        // Each optional column is written only when its flag is true, so an
        // omitted field keeps its value while an explicit null clears it.
        sqlx::query_as::<_, Batch>(
            "UPDATE creative_batches SET \
                status = $2, \
                status_version = status_version + 1, \
                started_at = CASE WHEN $3 THEN $4 ELSE started_at END, \
                completed_at = CASE WHEN $5 THEN $6 ELSE completed_at END, \
                error_code = CASE WHEN $7 THEN $8 ELSE error_code END, \
                error_message = CASE WHEN $9 THEN $10 ELSE error_message END, \
                token_usage = CASE WHEN $11 THEN $12 ELSE token_usage END, \
                updated_at = NOW() \
             WHERE id = $1 AND ($13::int4 IS NULL OR status_version = $13) \
             RETURNING *",
        )
        .bind(update.batch_id)
        .bind(update.status)
        .bind(update.started_at.is_write())
        .bind(update.started_at.value().copied())
        .bind(update.completed_at.is_write())
        .bind(update.completed_at.value().copied())
        .bind(update.error_code.is_write())
        .bind(update.error_code.value().cloned())
        .bind(update.error_message.is_write())
        .bind(update.error_message.value().cloned())
        .bind(update.token_usage.is_write())
        .bind(update.token_usage.value().cloned())
        .bind(expected_version)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to update batch status", e))
    }

    async fn find_prompt_assets(
        &mut self,
        merchant_id: MerchantId,
        ids: &[PromptAssetId],
    ) -> AppResult<Vec<PromptAsset>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        // Share locks hold ownership steady until the batch commits.
        sqlx::query_as::<_, PromptAsset>(
            "SELECT id, merchant_id, asset_type FROM prompt_assets \
             WHERE id = ANY($1) AND merchant_id = $2 FOR SHARE",
        )
        .bind(&ids)
        .bind(merchant_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to look up prompt assets", e))
    }

    async fn find_reference_assets(
        &mut self,
        merchant_id: MerchantId,
        ids: &[ReferenceAssetId],
    ) -> AppResult<Vec<ReferenceAsset>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        sqlx::query_as::<_, ReferenceAsset>(
            "SELECT id, merchant_id, kind FROM reference_assets \
             WHERE id = ANY($1) AND merchant_id = $2 FOR SHARE",
        )
        .bind(&ids)
        .bind(merchant_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to look up reference assets", e))
    }

    async fn find_copy(&mut self, id: CopyId) -> AppResult<Option<CreativeCopy>> {
        sqlx::query_as::<_, CreativeCopy>("SELECT * FROM creative_copies WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to find copy", e))
    }

    async fn find_copy_for_update(&mut self, id: CopyId) -> AppResult<Option<CreativeCopy>> {
        sqlx::query_as::<_, CreativeCopy>("SELECT * FROM creative_copies WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to find copy", e))
    }

    async fn find_copies(&mut self, batch_id: BatchId) -> AppResult<Vec<CreativeCopy>> {
        sqlx::query_as::<_, CreativeCopy>(
            "SELECT * FROM creative_copies WHERE batch_id = $1 ORDER BY sequence ASC",
        )
        .bind(batch_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to load copies", e))
    }

    async fn find_regenerations(&mut self, ids: &[CopyId]) -> AppResult<Vec<(CopyId, CopyId)>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        sqlx::query_as::<_, (CopyId, CopyId)>(
            "SELECT regenerated_from_id, id FROM creative_copies \
             WHERE regenerated_from_id = ANY($1) ORDER BY created_at ASC",
        )
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to load regenerations", e))
    }

    async fn update_copy(&mut self, id: CopyId, changes: &CopyChanges) -> AppResult<CreativeCopy> {
        sqlx::query_as::<_, CreativeCopy>(
            "UPDATE creative_copies SET \
                user_override = CASE WHEN $2 THEN $3 ELSE user_override END, \
                content_version = CASE WHEN $2 THEN content_version + 1 ELSE content_version END, \
                edited_by = CASE WHEN $2 THEN $4 ELSE edited_by END, \
                edited_at = CASE WHEN $2 THEN $5 ELSE edited_at END, \
                state = COALESCE($6, state), \
                updated_at = $5 \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(changes.content.is_some())
        .bind(&changes.content)
        .bind(changes.editor)
        .bind(changes.at)
        .bind(changes.state)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to update copy", e))
    }

    async fn insert_revision(&mut self, revision: &NewRevision) -> AppResult<CopyRevision> {
        sqlx::query_as::<_, CopyRevision>(
            "INSERT INTO creative_copy_revisions \
             (id, copy_id, version, content, source, note, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(CopyRevisionId::new())
        .bind(revision.copy_id)
        .bind(revision.version)
        .bind(&revision.content)
        .bind(revision.source)
        .bind(&revision.note)
        .bind(revision.created_by)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to insert copy revision", e))
    }

    async fn find_revisions(&mut self, copy_id: CopyId) -> AppResult<Vec<CopyRevision>> {
        sqlx::query_as::<_, CopyRevision>(
            "SELECT * FROM creative_copy_revisions WHERE copy_id = $1 ORDER BY version ASC",
        )
        .bind(copy_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to load copy revisions", e))
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))
    }
}
