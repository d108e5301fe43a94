//! Batch entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use creativehub_core::types::{BatchId, MerchantId, UserId};

use super::status::BatchStatus;

/// A unit of generation work tied to a merchant and a set of input assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Batch {
    /// Unique batch identifier.
    pub id: BatchId,
    /// Owning merchant.
    pub merchant_id: MerchantId,
    /// Batch this one was derived from (same merchant).
    pub parent_batch_id: Option<BatchId>,
    /// User who requested the batch.
    pub triggered_by: UserId,
    /// Model the worker should use.
    pub model_id: Option<String>,
    /// Current lifecycle status.
    pub status: BatchStatus,
    /// Incremented on every status write; starts at 0.
    pub status_version: i32,
    /// When the worker started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the worker reached an outcome.
    pub completed_at: Option<DateTime<Utc>>,
    /// Machine-readable failure code.
    pub error_code: Option<String>,
    /// Human-readable failure detail.
    pub error_message: Option<String>,
    /// Token accounting reported by the worker.
    pub token_usage: Option<serde_json::Value>,
    /// Free-form metadata (regeneration requests carry their target here).
    pub metadata: Option<serde_json::Value>,
    /// When the batch was created.
    pub created_at: DateTime<Utc>,
    /// When the batch row was last written.
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// Minimal projection used when surfacing a parent batch.
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            id: self.id,
            merchant_id: self.merchant_id,
            parent_batch_id: self.parent_batch_id,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Minimal projection of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BatchSummary {
    /// Batch identifier.
    pub id: BatchId,
    /// Owning merchant.
    pub merchant_id: MerchantId,
    /// Parent batch, if any.
    pub parent_batch_id: Option<BatchId>,
    /// Current lifecycle status.
    pub status: BatchStatus,
    /// When the batch was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to insert a batch row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBatch {
    /// Owning merchant.
    pub merchant_id: MerchantId,
    /// Parent batch, already checked to belong to `merchant_id`.
    pub parent_batch_id: Option<BatchId>,
    /// Requesting user.
    pub triggered_by: UserId,
    /// Model identifier.
    pub model_id: Option<String>,
    /// Initial status.
    pub status: BatchStatus,
    /// Free-form metadata.
    pub metadata: Option<serde_json::Value>,
}
