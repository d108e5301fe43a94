//! Integration tests for merchant access checks.

use creativehub::core::types::{MerchantId, UserId};
use creativehub::entity::copy::CopyEdit;
use creativehub::entity::regeneration::RegenerationRequest;
use creativehub::service::{CreateBatchRequest, CreativeError, RequestContext};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_member_sees_own_batches() {
    let app = TestApp::with_membership();
    let created = app.create_generated_batch(2).await;

    let detail = app
        .engine
        .get_batch_detail(&app.ctx, created.batch.id)
        .await
        .expect("own batch");
    assert_eq!(detail.copies.len(), 2);
}

#[tokio::test]
async fn test_outsider_gets_not_found() {
    let app = TestApp::with_membership();
    let created = app.create_generated_batch(2).await;
    let copy_id = app
        .engine
        .get_batch_detail(&app.ctx, created.batch.id)
        .await
        .expect("own batch")
        .copies[0]
        .copy
        .id;
    let outsider = RequestContext::new(UserId::new(), "USER");

    assert!(matches!(
        app.engine.get_batch_detail(&outsider, created.batch.id).await,
        Err(CreativeError::BatchNotFound(_))
    ));
    assert!(matches!(
        app.engine.get_copy(&outsider, copy_id).await,
        Err(CreativeError::CopyNotFound(_))
    ));
    assert!(matches!(
        app.engine
            .edit_copy(&outsider, copy_id, &CopyEdit::content("hijack"))
            .await,
        Err(CreativeError::CopyNotFound(_))
    ));
    assert!(matches!(
        app.engine
            .regenerate_single_copy(&outsider, copy_id, RegenerationRequest::default())
            .await,
        Err(CreativeError::CopyNotFound(_))
    ));
    assert!(matches!(
        app.engine.regenerate_batch(&outsider, created.batch.id).await,
        Err(CreativeError::BatchNotFound(_))
    ));

    let tables = app.store.snapshot().await;
    assert_eq!(tables.batches.len(), 1);
    assert_eq!(tables.revisions_of(copy_id).len(), 1);
}

#[tokio::test]
async fn test_create_for_other_merchant_is_denied() {
    let app = TestApp::with_membership();
    let other = MerchantId::new();
    let assets = app.seed_assets(other).await;

    let result = app
        .engine
        .create_batch(
            &app.ctx,
            CreateBatchRequest::new(other, app.ctx.user_id, assets.standard()),
        )
        .await;
    assert!(matches!(
        result,
        Err(CreativeError::MerchantAccessDenied(id)) if id == other
    ));
    assert!(app.store.snapshot().await.batches.is_empty());
}
