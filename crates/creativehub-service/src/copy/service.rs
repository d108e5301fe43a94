//! Copy version ledger: editor writes and revision history reads.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use creativehub_core::types::CopyId;
use creativehub_database::CreativeStore;
use creativehub_entity::batch::BatchSummary;
use creativehub_entity::copy::{
    CopyChanges, CopyEdit, CopyProjection, CopyRevision, CopyState, CreativeCopy, NewRevision,
    RevisionSource,
};

use crate::context::RequestContext;
use crate::error::CreativeError;

/// A copy with its batch and full revision history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyDetail {
    /// The copy row.
    #[serde(flatten)]
    pub copy: CreativeCopy,
    /// The owning batch.
    pub batch: BatchSummary,
    /// Revisions ordered by version.
    pub revisions: Vec<CopyRevision>,
}

/// Applies editor changes to copies and keeps the revision log in step.
#[derive(Debug, Clone)]
pub struct CopyService {
    /// Transactional store.
    store: Arc<dyn CreativeStore>,
}

impl CopyService {
    /// Creates a new copy service.
    pub fn new(store: Arc<dyn CreativeStore>) -> Self {
        Self { store }
    }

    /// Edit one copy's content, state, or both.
    ///
    /// A content change bumps `content_version` by one and appends exactly
    /// one `USER` revision carrying the new version, in the same
    /// transaction. A state-only change writes no revision.
    pub async fn edit_copy(
        &self,
        ctx: &RequestContext,
        copy_id: CopyId,
        edit: &CopyEdit,
    ) -> Result<CopyProjection, CreativeError> {
        if edit.is_empty() {
            return Err(CreativeError::EmptyEdit);
        }
        let state = edit
            .state
            .as_deref()
            .map(|s| s.parse::<CopyState>().map_err(CreativeError::InvalidCopyState))
            .transpose()?;

        let mut tx = self.store.begin().await?;
        if tx.find_copy_for_update(copy_id).await?.is_none() {
            return Err(CreativeError::CopyNotFound(copy_id));
        }

        let changes = CopyChanges {
            content: edit.content.clone(),
            state,
            editor: ctx.user_id,
            at: Utc::now(),
        };
        let updated = tx.update_copy(copy_id, &changes).await?;

        let revision = match &edit.content {
            Some(content) => Some(
                tx.insert_revision(&NewRevision {
                    copy_id,
                    version: updated.content_version,
                    content: content.clone(),
                    source: RevisionSource::User,
                    note: edit.note.clone(),
                    created_by: Some(ctx.user_id),
                })
                .await?,
            ),
            None => None,
        };
        tx.commit().await?;

        info!(
            user_id = %ctx.user_id,
            copy_id = %copy_id,
            content_version = updated.content_version,
            state = %updated.state,
            revision = revision.is_some(),
            "Copy edited"
        );

        Ok(updated.projection())
    }

    /// Load a copy with its batch summary and revisions.
    pub async fn get_copy(&self, copy_id: CopyId) -> Result<CopyDetail, CreativeError> {
        let mut tx = self.store.begin().await?;
        let copy = tx
            .find_copy(copy_id)
            .await?
            .ok_or(CreativeError::CopyNotFound(copy_id))?;
        let batch = tx
            .find_batch(copy.batch_id)
            .await?
            .ok_or(CreativeError::BatchNotFound(copy.batch_id))?
            .summary();
        let revisions = tx.find_revisions(copy_id).await?;
        tx.commit().await?;

        Ok(CopyDetail {
            copy,
            batch,
            revisions,
        })
    }
}
