//! Integration tests for batch creation and worker status writes.

use chrono::Utc;
use serde_json::json;

use creativehub::core::error::ErrorKind;
use creativehub::core::types::{MerchantId, Patch};
use creativehub::core::AppError;
use creativehub::database::FailurePoint;
use creativehub::entity::asset::{AssetRole, BatchAssetInput};
use creativehub::entity::batch::{BatchStatus, StatusUpdate};
use creativehub::service::{CreateBatchRequest, CreativeError, completion_update};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_create_batch_with_standard_assets() {
    let app = TestApp::new();
    let assets = app.seed_assets(app.merchant).await;

    let created = app.create_batch(&assets).await;

    assert_eq!(created.batch.status, BatchStatus::Queued);
    assert_eq!(created.batch.status_version, 0);
    assert_eq!(created.batch.merchant_id, app.merchant);
    assert_eq!(created.batch.triggered_by, app.ctx.user_id);
    assert_eq!(created.assets.len(), 3);
    let roles: Vec<AssetRole> = created.assets.iter().map(|a| a.role).collect();
    assert_eq!(
        roles,
        vec![AssetRole::Report, AssetRole::Prompt, AssetRole::Attachment]
    );

    let tables = app.store.snapshot().await;
    assert_eq!(tables.batches.len(), 1);
    assert_eq!(tables.assets_of(created.batch.id).len(), 3);
}

#[tokio::test]
async fn test_missing_report_role_is_rejected() {
    let app = TestApp::new();
    let assets = app.seed_assets(app.merchant).await;

    let result = app
        .engine
        .create_batch(
            &app.ctx,
            CreateBatchRequest::new(
                app.merchant,
                app.ctx.user_id,
                vec![BatchAssetInput::new(AssetRole::Prompt, assets.prompt)],
            ),
        )
        .await;

    let err = result.expect_err("REPORT is mandatory");
    assert!(matches!(
        err,
        CreativeError::RoleCount {
            role: AssetRole::Report,
            count: 0
        }
    ));
    assert!(err.to_string().contains("REPORT"));
    assert!(app.store.snapshot().await.batches.is_empty());
}

#[tokio::test]
async fn test_foreign_report_is_an_ownership_error() {
    let app = TestApp::new();
    let own = app.seed_assets(app.merchant).await;
    let foreign = app.seed_assets(MerchantId::new()).await;

    let assets = vec![
        BatchAssetInput::new(AssetRole::Report, foreign.report),
        BatchAssetInput::new(AssetRole::Prompt, own.prompt),
        BatchAssetInput::new(AssetRole::Attachment, own.attachment),
    ];
    let result = app
        .engine
        .create_batch(
            &app.ctx,
            CreateBatchRequest::new(app.merchant, app.ctx.user_id, assets),
        )
        .await;

    match result {
        Err(CreativeError::AssetsNotOwned { missing }) => {
            assert_eq!(missing, vec![foreign.report]);
        }
        other => panic!("expected ownership error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_every_missing_asset_is_listed() {
    let app = TestApp::new();
    let own = app.seed_assets(app.merchant).await;
    let foreign = app.seed_assets(MerchantId::new()).await;

    let assets = vec![
        BatchAssetInput::new(AssetRole::Report, own.report),
        BatchAssetInput::new(AssetRole::Prompt, foreign.prompt),
        BatchAssetInput::new(AssetRole::Topic, foreign.topic),
        BatchAssetInput::new(AssetRole::Benchmark, own.benchmark),
    ];
    let err = app
        .engine
        .create_batch(
            &app.ctx,
            CreateBatchRequest::new(app.merchant, app.ctx.user_id, assets),
        )
        .await
        .expect_err("two foreign assets");

    let message = err.to_string();
    assert!(message.contains(&foreign.prompt.to_string()));
    assert!(message.contains(&foreign.topic.to_string()));

    let app_err: AppError = err.into();
    assert_eq!(app_err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_misclassified_asset_names_expected_and_actual() {
    let app = TestApp::new();
    let assets = app.seed_assets(app.merchant).await;

    let inputs = vec![
        BatchAssetInput::new(AssetRole::Report, assets.report),
        BatchAssetInput::new(AssetRole::Prompt, assets.prompt),
        BatchAssetInput::new(AssetRole::Attachment, assets.benchmark),
    ];
    let err = app
        .engine
        .create_batch(
            &app.ctx,
            CreateBatchRequest::new(app.merchant, app.ctx.user_id, inputs),
        )
        .await
        .expect_err("benchmark under ATTACHMENT");

    assert!(matches!(err, CreativeError::ClassificationMismatch { .. }));
    assert!(
        err.to_string()
            .contains("expected RAW_ATTACHMENT, found BENCHMARK")
    );
}

#[tokio::test]
async fn test_failed_asset_insert_leaves_no_orphan_batch() {
    let app = TestApp::new();
    let assets = app.seed_assets(app.merchant).await;
    app.store.inject_failure(FailurePoint::InsertBatchAssets).await;

    let result = app
        .engine
        .create_batch(
            &app.ctx,
            CreateBatchRequest::new(app.merchant, app.ctx.user_id, assets.standard()),
        )
        .await;
    assert!(matches!(result, Err(CreativeError::Store(_))));

    let tables = app.store.snapshot().await;
    assert!(tables.batches.is_empty());
    assert!(tables.batch_assets.is_empty());

    let retried = app.create_batch(&assets).await;
    assert_eq!(retried.assets.len(), 3);
}

#[tokio::test]
async fn test_worker_lifecycle_bumps_status_version() {
    let app = TestApp::new();
    let created = app.create_generated_batch(0).await;
    let batch_id = created.batch.id;

    let running = app
        .engine
        .update_batch_status(&StatusUpdate::new(batch_id, BatchStatus::Running).started_at(Utc::now()))
        .await
        .expect("running");
    assert_eq!(running.status_version, 1);
    assert!(running.started_at.is_some());

    let usage = app
        .engine
        .update_batch_status(
            &StatusUpdate::new(batch_id, BatchStatus::Running).token_usage(json!({"input": 1200})),
        )
        .await
        .expect("usage");
    assert_eq!(usage.status_version, 2);
    assert_eq!(usage.started_at, running.started_at);
    assert_eq!(usage.token_usage, Some(json!({"input": 1200})));

    for sequence in 1..=3 {
        app.store
            .insert_copy(batch_id, sequence, "generated")
            .await
            .expect("copy");
    }
    let update = completion_update(&usage, 3, 5, Utc::now(), None);
    let finished = app.engine.update_batch_status(&update).await.expect("finish");
    assert_eq!(finished.status, BatchStatus::PartialSuccess);
    assert_eq!(finished.status_version, 3);
    assert_eq!(
        finished.error_message.as_deref(),
        Some("Only 3/5 copies were generated")
    );
    assert_eq!(finished.token_usage, Some(json!({"input": 1200})));

    let mut clear = StatusUpdate::new(batch_id, BatchStatus::Succeeded).clear_error();
    clear.token_usage = Patch::Clear;
    let cleared = app.engine.update_batch_status(&clear).await.expect("clear");
    assert_eq!(cleared.status_version, 4);
    assert!(cleared.error_message.is_none());
    assert!(cleared.token_usage.is_none());
    assert!(cleared.completed_at.is_some());
}

#[tokio::test]
async fn test_stale_conditional_write_is_not_applied() {
    let app = TestApp::new();
    let created = app.create_generated_batch(0).await;
    let batch_id = created.batch.id;

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
