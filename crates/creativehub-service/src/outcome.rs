//! Terminal status rule the generation worker applies after a run.

use chrono::{DateTime, Utc};

use creativehub_core::types::{BatchId, Patch};
use creativehub_entity::batch::{Batch, BatchStatus, StatusUpdate};
use creativehub_entity::regeneration::is_single_sequence;

/// Decide a batch's terminal status from how many copies the worker wrote.
///
/// A single-sequence batch succeeds only with exactly one copy. A full
/// batch succeeds at `expected_copies`, is a partial success with fewer,
/// and fails with none.
pub fn decide_final_status(
    copies_generated: usize,
    single_sequence: bool,
    expected_copies: u32,
) -> BatchStatus {
    if single_sequence {
        return if copies_generated == 1 {
            BatchStatus::Succeeded
        } else {
            BatchStatus::Failed
        };
    }
    match copies_generated {
        0 => BatchStatus::Failed,
        n if n >= expected_copies as usize => BatchStatus::Succeeded,
        _ => BatchStatus::PartialSuccess,
    }
}

/// Build the worker's final status write for `batch`.
///
/// Partial successes carry an explanatory `error_message`; the error code
/// is left untouched.
pub fn completion_update(
    batch: &Batch,
    copies_generated: usize,
    expected_copies: u32,
    completed_at: DateTime<Utc>,
    token_usage: Option<serde_json::Value>,
) -> StatusUpdate {
    let status = decide_final_status(copies_generated, is_single_sequence(batch), expected_copies);
    let mut update = StatusUpdate::new(batch.id, status).completed_at(completed_at);
    if let Some(usage) = token_usage {
        update = update.token_usage(usage);
    }
    if status == BatchStatus::PartialSuccess {
        update.error_message = Patch::Set(format!(
            "Only {copies_generated}/{expected_copies} copies were generated"
        ));
    }
    update
}

/// The worker's failure write: terminal `FAILED` with an error code and message.
pub fn failure_update(
    batch_id: BatchId,
    error_code: &str,
    error_message: &str,
    completed_at: DateTime<Utc>,
) -> StatusUpdate {
    StatusUpdate::new(batch_id, BatchStatus::Failed)
        .completed_at(completed_at)
        .error(error_code, error_message)
}
