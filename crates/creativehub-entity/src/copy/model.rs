//! Copy entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use creativehub_core::types::{BatchId, CopyId, UserId};

use super::state::CopyState;

/// One generated text artifact belonging to a batch.
///
/// Rows are inserted by the generation worker; this crate only ever
/// mutates existing rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CreativeCopy {
    /// Copy identifier.
    pub id: CopyId,
    /// Owning batch.
    pub batch_id: BatchId,
    /// Slot within the batch, 1..=5.
    pub sequence: i32,
    /// Editorial state.
    pub state: CopyState,
    /// Markdown produced by the worker.
    pub markdown_content: String,
    /// Editor's replacement text, if any.
    pub user_override: Option<String>,
    /// Unparsed model output.
    pub raw_model_output: Option<serde_json::Value>,
    /// Starts at 1, incremented once per accepted content edit.
    pub content_version: i32,
    /// Copy this one was regenerated from.
    pub regenerated_from_id: Option<CopyId>,
    /// Last editor.
    pub edited_by: Option<UserId>,
    /// Last content edit.
    pub edited_at: Option<DateTime<Utc>>,
    /// When the worker inserted the row.
    pub created_at: DateTime<Utc>,
    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
}

impl CreativeCopy {
    /// The text a reader should see: the override when present.
    pub fn effective_content(&self) -> &str {
        self.user_override.as_deref().unwrap_or(&self.markdown_content)
    }

    /// Caller-facing projection returned after an edit.
    pub fn projection(&self) -> CopyProjection {
        CopyProjection {
            id: self.id,
            batch_id: self.batch_id,
            sequence: self.sequence,
            state: self.state,
            markdown_content: self.markdown_content.clone(),
            user_override: self.user_override.clone(),
            content_version: self.content_version,
            edited_by: self.edited_by,
            edited_at: self.edited_at,
            updated_at: self.updated_at,
        }
    }
}

/// The copy fields surfaced to a caller after an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyProjection {
    /// Copy identifier.
    pub id: CopyId,
    /// Owning batch.
    pub batch_id: BatchId,
    /// Slot within the batch.
    pub sequence: i32,
    /// Editorial state.
    pub state: CopyState,
    /// Markdown produced by the worker.
    pub markdown_content: String,
    /// Editor's replacement text.
    pub user_override: Option<String>,
    /// Current content version.
    pub content_version: i32,
    /// Last editor.
    pub edited_by: Option<UserId>,
    /// Last content edit.
    pub edited_at: Option<DateTime<Utc>>,
    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
}

/// A single-row write to a copy.
///
/// When `content` is set the store bumps `content_version` by one and
/// stamps `edited_by`/`edited_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyChanges {
    /// New override text.
    pub content: Option<String>,
    /// New editorial state.
    pub state: Option<CopyState>,
    /// Acting user, stamped as editor on content changes.
    pub editor: UserId,
    /// Write time.
    pub at: DateTime<Utc>,
}
