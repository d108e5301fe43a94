//! Editorial state of a copy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Editorial state of a generated copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "creative_copy_state", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CopyState {
    /// Fresh from the worker or under edit.
    Draft,
    /// Accepted by an editor.
    Approved,
    /// Turned down by an editor.
    Rejected,
    /// Hidden from active views.
    Archived,
}

impl CopyState {
    /// Every state.
    pub const ALL: [CopyState; 4] = [Self::Draft, Self::Approved, Self::Rejected, Self::Archived];

    /// Return the state as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for CopyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CopyState {
    type Err = String;

    /// Exact, case-sensitive match on the stored name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}
