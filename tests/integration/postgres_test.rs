//! Integration tests over PostgreSQL.
//!
//! Each test returns early unless `CREATIVEHUB_TEST_DATABASE_URL` names a
//! scratch database. Every test works under a fresh merchant, so they share
//! one database without cleanup.

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use creativehub::core::types::{MerchantId, PromptAssetId};
use creativehub::database::{CreativeStore, CreativeTx};
use creativehub::entity::asset::{AssetRole, BatchAssetInput, NewBatchAsset};
use creativehub::entity::batch::{BatchStatus, NewBatch, StatusUpdate};
use creativehub::entity::copy::{CopyEdit, CopyState, RevisionSource};
use creativehub::service::{CreateBatchRequest, CreativeError};

use crate::helpers::PgTestApp;

#[tokio::test]
async fn test_pg_create_batch_writes_assets_in_order() {
    let Some(app) = PgTestApp::connect().await else {
        return;
    };
    let assets = app.seed_assets(app.merchant).await;
    let created = app.create_batch(&assets).await;
    assert_eq!(created.batch.status, BatchStatus::Queued);
    assert_eq!(created.batch.status_version, 0);

    let rows: Vec<(String, i32, Option<Uuid>, Option<Uuid>)> = sqlx::query_as(
        "SELECT role::text, sort_order, prompt_asset_id, reference_asset_id \
         FROM creative_batch_assets WHERE batch_id = $1 ORDER BY sort_order",
    )
    .bind(created.batch.id)
    .fetch_all(&app.db_pool)
    .await
    .expect("assets");
    assert_eq!(
        rows.iter().map(|r| (r.0.as_str(), r.1)).collect::<Vec<_>>(),
        vec![("REPORT", 0), ("PROMPT", 1), ("ATTACHMENT", 2)]
    );
    assert_eq!(rows[0].2, Some(assets.report));
    assert_eq!(rows[2].3, Some(assets.attachment));
    assert!(rows[2].2.is_none());
}

#[tokio::test]
async fn test_pg_rejected_create_stores_nothing() {
    let Some(app) = PgTestApp::connect().await else {
        return;
    };
    let mine = app.seed_assets(app.merchant).await;
    let theirs = app.seed_assets(MerchantId::new()).await;

    let mut inputs = mine.standard();
    inputs.push(BatchAssetInput::new(AssetRole::Topic, theirs.topic));
    let result = app
        .engine
        .create_batch(
            &app.ctx,
            CreateBatchRequest::new(app.merchant, app.ctx.user_id, inputs),
        )
        .await;
    assert!(matches!(result, Err(CreativeError::AssetsNotOwned { .. })));
    assert_eq!(app.batch_count(app.merchant).await, 0);
}

#[tokio::test]
async fn test_pg_failed_asset_insert_rolls_back_batch() {
    let Some(app) = PgTestApp::connect().await else {
        return;
    };
    let mut tx = app.store.begin().await.expect("begin");
    let batch = tx
        .insert_batch(&NewBatch {
            merchant_id: app.merchant,
            parent_batch_id: None,
            triggered_by: app.ctx.user_id,
            model_id: None,
            status: BatchStatus::Queued,
            metadata: None,
        })
        .await
        .expect("batch row");

    let dangling = BatchAssetInput::new(AssetRole::Report, PromptAssetId::new().into_uuid());
    let result = tx
        .insert_batch_assets(batch.id, &[NewBatchAsset::from_input(&dangling, 0)])
        .await;
    assert!(result.is_err());
    drop(tx);

    assert_eq!(app.batch_count(app.merchant).await, 0);
}

#[tokio::test]
async fn test_pg_status_writes_keep_omitted_and_clear_null() {
    let Some(app) = PgTestApp::connect().await else {
        return;
    };
    let assets = app.seed_assets(app.merchant).await;
    let batch_id = app.create_batch(&assets).await.batch.id;

    let running = app
        .engine
        .update_batch_status(
            &StatusUpdate::new(batch_id, BatchStatus::Running)
                .started_at(Utc::now())
                .error("RETRYING", "model warm-up"),
        )
        .await
        .expect("running");
    assert_eq!(running.status_version, 1);

    let usage = app
        .engine
        .update_batch_status(
            &StatusUpdate::new(batch_id, BatchStatus::Running).token_usage(json!({"input": 800})),
        )
        .await
        .expect("usage");
    assert_eq!(usage.status_version, 2);
    assert_eq!(usage.started_at, running.started_at);
    assert_eq!(usage.error_code.as_deref(), Some("RETRYING"));
    assert_eq!(usage.token_usage, Some(json!({"input": 800})));

    let cleared = app
        .engine
        .update_batch_status(&StatusUpdate::new(batch_id, BatchStatus::Running).clear_error())
        .await
        .expect("clear");
    assert_eq!(cleared.status_version, 3);
    assert!(cleared.error_code.is_none());
    assert!(cleared.error_message.is_none());
    assert_eq!(cleared.token_usage, Some(json!({"input": 800})));
    assert_eq!(cleared.started_at, running.started_at);
}

#[tokio::test]
async fn test_pg_conditional_write_checks_version() {
    let Some(app) = PgTestApp::connect().await else {
        return;
    };
    let assets = app.seed_assets(app.merchant).await;
    let batch_id = app.create_batch(&assets).await.batch.id;

    app.engine
        .update_batch_status(&StatusUpdate::new(batch_id, BatchStatus::Running))
        .await
        .expect("running");

    let stale = app
        .engine
        .batches
        .update_batch_status_if(&StatusUpdate::new(batch_id, BatchStatus::Failed), 0)
        .await
        .expect("no store error");
    assert!(stale.is_none());

    let fresh = app
        .engine
        .batches
        .update_batch_status_if(&StatusUpdate::new(batch_id, BatchStatus::Succeeded), 1)
        .await
        .expect("no store error")
        .expect("applied");
    assert_eq!(fresh.status, BatchStatus::Succeeded);
    assert_eq!(fresh.status_version, 2);
}

#[tokio::test]
async fn test_pg_edit_copy_appends_user_revision() {
    let Some(app) = PgTestApp::connect().await else {
        return;
    };
    let assets = app.seed_assets(app.merchant).await;
    let batch_id = app.create_batch(&assets).await.batch.id;
    let copy_id = app.insert_copy(batch_id, 1, "model copy").await;

    let projection = app
        .engine
        .edit_copy(&app.ctx, copy_id, &CopyEdit::content("v2 text"))
        .await
        .expect("edit");
    assert_eq!(projection.content_version, 2);

    let archived = app
        .engine
        .edit_copy(&app.ctx, copy_id, &CopyEdit::state("ARCHIVED"))
        .await
        .expect("archive");
    assert_eq!(archived.content_version, 2);
    assert_eq!(archived.state, CopyState::Archived);

    let detail = app.engine.get_copy(&app.ctx, copy_id).await.expect("copy");
    assert_eq!(detail.copy.effective_content(), "v2 text");
    assert_eq!(detail.revisions.len(), 2);
    assert_eq!(detail.revisions[1].version, 2);
    assert_eq!(detail.revisions[1].source, RevisionSource::User);
    assert_eq!(detail.revisions[1].created_by, Some(app.ctx.user_id));
}

#[tokio::test]
async fn test_pg_ownership_lookup_locks_assets() {
    let Some(app) = PgTestApp::connect().await else {
        return;
    };
    let assets = app.seed_assets(app.merchant).await;
    let report = PromptAssetId::from_uuid(assets.report);

    let mut tx = app.store.begin().await.expect("begin");
    let found = tx
        .find_prompt_assets(app.merchant, &[report])
        .await
        .expect("lookup");
    assert_eq!(found.len(), 1);

    let blocked = sqlx::query("SELECT id FROM prompt_assets WHERE id = $1 FOR UPDATE NOWAIT")
        .bind(assets.report)
        .execute(&app.db_pool)
        .await;
    assert!(blocked.is_err());

    tx.commit().await.expect("commit");
    sqlx::query("SELECT id FROM prompt_assets WHERE id = $1 FOR UPDATE NOWAIT")
        .bind(assets.report)
        .execute(&app.db_pool)
        .await
        .expect("lock released");
}
