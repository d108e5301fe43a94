//! Batch lifecycle status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a generation batch.
///
/// `Queued → Running → {Succeeded, PartialSuccess, Failed}`. The three
/// outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "creative_batch_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    /// Waiting for the worker.
    Queued,
    /// Picked up by the worker.
    Running,
    /// Every expected copy was produced.
    Succeeded,
    /// Some, but not all, expected copies were produced.
    PartialSuccess,
    /// No usable output.
    Failed,
}

impl BatchStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [BatchStatus; 5] = [
        Self::Queued,
        Self::Running,
        Self::Succeeded,
        Self::PartialSuccess,
        Self::Failed,
    ];

    /// Check if the batch has reached an outcome.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::PartialSuccess | Self::Failed)
    }

    /// Return the status as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::PartialSuccess => "PARTIAL_SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

impl Default for BatchStatus {
    fn default() -> Self {
        Self::Queued
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_string())
    }
}
