//! Append-only copy revision log.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use creativehub_core::types::{CopyId, CopyRevisionId, UserId};

/// Where a revision's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "copy_revision_source", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevisionSource {
    /// Written by the worker from model output.
    Model,
    /// Written by a human editor.
    User,
    /// Written by a regeneration run.
    Regenerate,
}

impl RevisionSource {
    /// Database and wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "MODEL",
            Self::User => "USER",
            Self::Regenerate => "REGENERATE",
        }
    }
}

impl fmt::Display for RevisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable snapshot of one content version of a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CopyRevision {
    /// Revision identifier.
    pub id: CopyRevisionId,
    /// Copy this revision belongs to.
    pub copy_id: CopyId,
    /// Equals the copy's `content_version` when the revision was written.
    pub version: i32,
    /// Content snapshot.
    pub content: String,
    /// Provenance.
    pub source: RevisionSource,
    /// Editor's note.
    pub note: Option<String>,
    /// Author; `None` for worker-written revisions.
    pub created_by: Option<UserId>,
    /// When the revision was written.
    pub created_at: DateTime<Utc>,
}

/// Data required to append a revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRevision {
    /// Copy the revision belongs to.
    pub copy_id: CopyId,
    /// Content version the revision records.
    pub version: i32,
    /// Content snapshot.
    pub content: String,
    /// Provenance.
    pub source: RevisionSource,
    /// Editor's note.
    pub note: Option<String>,
    /// Author.
    pub created_by: Option<UserId>,
}
