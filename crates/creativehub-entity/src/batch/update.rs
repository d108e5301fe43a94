//! Worker-driven status write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use creativehub_core::types::{BatchId, Patch};

use super::status::BatchStatus;

/// A status write reported by the generation worker.
///
/// Every optional column is a [`Patch`]: omitted fields keep their stored
/// value, explicit nulls clear the column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Target batch.
    pub batch_id: BatchId,
    /// New status (may equal the current one).
    pub status: BatchStatus,
    /// Worker start time.
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub started_at: Patch<DateTime<Utc>>,
    /// Worker completion time.
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub completed_at: Patch<DateTime<Utc>>,
    /// Failure code.
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub error_code: Patch<String>,
    /// Failure detail.
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub error_message: Patch<String>,
    /// Token accounting blob.
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub token_usage: Patch<serde_json::Value>,
}

impl StatusUpdate {
    /// A write that only changes the status column.
    pub fn new(batch_id: BatchId, status: BatchStatus) -> Self {
        Self {
            batch_id,
            status,
            started_at: Patch::Unchanged,
            completed_at: Patch::Unchanged,
            error_code: Patch::Unchanged,
            error_message: Patch::Unchanged,
            token_usage: Patch::Unchanged,
        }
    }

    /// Set `started_at`.
    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Patch::Set(at);
        self
    }

    /// Set `completed_at`.
    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Patch::Set(at);
        self
    }

    /// Set both error columns.
    pub fn error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error_code = Patch::Set(code.into());
        self.error_message = Patch::Set(message.into());
        self
    }

    /// Clear both error columns.
    pub fn clear_error(mut self) -> Self {
        self.error_code = Patch::Clear;
        self.error_message = Patch::Clear;
        self
    }

    /// Set the token accounting blob.
    pub fn token_usage(mut self, usage: serde_json::Value) -> Self {
        self.token_usage = Patch::Set(usage);
        self
    }
}
