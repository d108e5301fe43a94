//! Integration tests for regeneration batches.

use chrono::Utc;
use serde_json::json;

use creativehub::entity::batch::BatchStatus;
use creativehub::entity::regeneration::{
    RegenerationMetadata, RegenerationRequest, is_single_sequence, target_sequence,
};
use creativehub::service::{CreateBatchRequest, completion_update};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_regenerate_third_copy() {
    let app = TestApp::new();
    let source = app.create_generated_batch(5).await;
    let detail = app
        .engine
        .get_batch_detail(&app.ctx, source.batch.id)
        .await
        .expect("detail");
    let third = detail.copies[2].copy.id;
    let copies_before = app.store.snapshot().await.copies.len();

    let ticket = app
        .engine
        .regenerate_single_copy(
            &app.ctx,
            third,
            RegenerationRequest {
                append_prompt: Some("shorter".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("regenerate");
    assert_eq!(ticket.target_sequence, 3);
    assert_eq!(ticket.status, BatchStatus::Queued);

    let tables = app.store.snapshot().await;
    assert_eq!(tables.copies.len(), copies_before);
    let child = &tables.batches[&ticket.new_batch_id];
    assert_eq!(child.parent_batch_id, Some(source.batch.id));
    let metadata = child.metadata.as_ref().expect("metadata");
    assert_eq!(metadata["targetSequence"], json!(3));
    assert_eq!(metadata["appendPrompt"], json!("shorter"));
    assert_eq!(tables.assets_of(child.id).len(), source.assets.len());
}

#[tokio::test]
async fn test_worker_completes_single_copy_regeneration() {
    let app = TestApp::new();
    let source = app.create_generated_batch(5).await;
    let detail = app
        .engine
        .get_batch_detail(&app.ctx, source.batch.id)
        .await
        .expect("detail");
    let third = detail.copies[2].copy.id;

    let ticket = app
        .engine
        .regenerate_single_copy(&app.ctx, third, RegenerationRequest::default())
        .await
        .expect("regenerate");

    let child = app
        .engine
        .get_batch_detail(&app.ctx, ticket.new_batch_id)
        .await
        .expect("child");
    let sequence = target_sequence(&child.batch).expect("target sequence");
    app.store
        .insert_regenerated_copy(child.batch.id, sequence, "fresh", third)
        .await
        .expect("worker copy");

    let update = completion_update(&child.batch, 1, 5, Utc::now(), None);
    let finished = app.engine.update_batch_status(&update).await.expect("finish");
    assert_eq!(finished.status, BatchStatus::Succeeded);
    assert!(finished.error_message.is_none());

    let parent = app
        .engine
        .get_batch_detail(&app.ctx, source.batch.id)
        .await
        .expect("parent");
    assert_eq!(parent.copies.len(), 5);
    assert_eq!(parent.copies[2].regeneration_ids.len(), 1);
    assert!(parent.copies[0].regeneration_ids.is_empty());

    let child = app
        .engine
        .get_batch_detail(&app.ctx, ticket.new_batch_id)
        .await
        .expect("child");
    assert_eq!(child.parent_batch.map(|p| p.id), Some(source.batch.id));
    assert_eq!(child.copies.len(), 1);
    assert_eq!(child.copies[0].copy.sequence, 3);
}

#[tokio::test]
async fn test_worker_completes_bare_target_sequence_batch() {
    let app = TestApp::new();
    let assets = app.seed_assets(app.merchant).await;
    let created = app
        .engine
        .create_batch(
            &app.ctx,
            CreateBatchRequest::new(app.merchant, app.ctx.user_id, assets.standard())
                .with_metadata(json!({"targetSequence": 2})),
        )
        .await
        .expect("create");
    app.store
        .insert_copy(created.batch.id, 2, "only this one")
        .await
        .expect("worker copy");

    let update = completion_update(&created.batch, 1, 5, Utc::now(), None);
    let finished = app.engine.update_batch_status(&update).await.expect("finish");
    assert_eq!(finished.status, BatchStatus::Succeeded);
    assert!(finished.error_message.is_none());
}

#[tokio::test]
async fn test_regenerate_whole_batch() {
    let app = TestApp::new();
    let source = app.create_generated_batch(5).await;

    let created = app
        .engine
        .regenerate_batch(&app.ctx, source.batch.id)
        .await
        .expect("regenerate");
    assert_eq!(created.batch.parent_batch_id, Some(source.batch.id));
    assert_eq!(created.parent_batch.map(|p| p.id), Some(source.batch.id));
    assert!(!is_single_sequence(&created.batch));
    assert!(
        RegenerationMetadata::from_batch(&created.batch)
            .expect("valid metadata")
            .is_none()
    );

    let update = completion_update(&created.batch, 0, 5, Utc::now(), None);
    assert_eq!(update.status, BatchStatus::Failed);
}
