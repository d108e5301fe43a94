//! Integration tests for copy edits and revision history.

use creativehub::core::types::CopyId;
use creativehub::database::FailurePoint;
use creativehub::entity::copy::{CopyEdit, CopyState, RevisionSource};
use creativehub::service::CreativeError;

use crate::helpers::TestApp;

async fn first_copy(app: &TestApp) -> CopyId {
    let created = app.create_generated_batch(5).await;
    let detail = app
        .engine
        .get_batch_detail(&app.ctx, created.batch.id)
        .await
        .expect("detail");
    assert_eq!(detail.copies.len(), 5);
    detail.copies[0].copy.id
}

#[tokio::test]
async fn test_edit_content_appends_user_revision() {
    let app = TestApp::new();
    let copy_id = first_copy(&app).await;

    let projection = app
        .engine
        .edit_copy(&app.ctx, copy_id, &CopyEdit::content("v2 text"))
        .await
        .expect("edit");
    assert_eq!(projection.content_version, 2);
    assert_eq!(projection.user_override.as_deref(), Some("v2 text"));

    let detail = app.engine.get_copy(&app.ctx, copy_id).await.expect("copy");
    assert_eq!(detail.copy.content_version, 2);
    assert_eq!(detail.copy.effective_content(), "v2 text");
    assert_eq!(detail.revisions.len(), 2);

    let new_revisions: Vec<_> = detail
        .revisions
        .iter()
        .filter(|r| r.source == RevisionSource::User)
        .collect();
    assert_eq!(new_revisions.len(), 1);
    assert_eq!(new_revisions[0].version, 2);
    assert_eq!(new_revisions[0].created_by, Some(app.ctx.user_id));
}

#[tokio::test]
async fn test_state_only_edit_keeps_version() {
    let app = TestApp::new();
    let copy_id = first_copy(&app).await;

    let projection = app
        .engine
        .edit_copy(&app.ctx, copy_id, &CopyEdit::state("ARCHIVED"))
        .await
        .expect("edit");
    assert_eq!(projection.state, CopyState::Archived);
    assert_eq!(projection.content_version, 1);
    assert_eq!(app.store.snapshot().await.revisions_of(copy_id).len(), 1);
}

#[tokio::test]
async fn test_content_and_state_in_one_edit() {
    let app = TestApp::new();
    let copy_id = first_copy(&app).await;

    let edit = CopyEdit {
        content: Some("final".to_string()),
        state: Some("APPROVED".to_string()),
        note: Some("ready to ship".to_string()),
    };
    let projection = app.engine.edit_copy(&app.ctx, copy_id, &edit).await.expect("edit");
    assert_eq!(projection.state, CopyState::Approved);
    assert_eq!(projection.content_version, 2);

    let revisions = app.store.snapshot().await.revisions_of(copy_id);
    assert_eq!(revisions.len(), 2);
    assert_eq!(revisions[1].note.as_deref(), Some("ready to ship"));
}

#[tokio::test]
async fn test_failed_edit_changes_nothing() {
    let app = TestApp::new();
    let copy_id = first_copy(&app).await;
    app.store.inject_failure(FailurePoint::InsertRevision).await;

    let result = app
        .engine
        .edit_copy(&app.ctx, copy_id, &CopyEdit::content("never committed"))
        .await;
    assert!(matches!(result, Err(CreativeError::Store(_))));

    let detail = app.engine.get_copy(&app.ctx, copy_id).await.expect("copy");
    assert_eq!(detail.copy.content_version, 1);
    assert_eq!(detail.copy.effective_content(), "model copy 1");
    assert_eq!(detail.revisions.len(), 1);
}

#[tokio::test]
async fn test_invalid_edits_are_structural() {
    let app = TestApp::new();
    let copy_id = first_copy(&app).await;

    let empty = app
        .engine
        .edit_copy(&app.ctx, copy_id, &CopyEdit::default())
        .await;
    assert!(matches!(empty, Err(CreativeError::EmptyEdit)));

    let unknown = app
        .engine
        .edit_copy(&app.ctx, copy_id, &CopyEdit::state("draft"))
        .await;
    assert!(matches!(unknown, Err(CreativeError::InvalidCopyState(_))));
}
