//! Caller-supplied copy edit.

use serde::{Deserialize, Serialize};

/// An editor's change to one copy.
///
/// `state` is kept as the caller sent it and parsed by the ledger, so an
/// unknown value surfaces as a validation error rather than a decode error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyEdit {
    /// Replacement text. Any string, including an empty one, is an edit.
    #[serde(default)]
    pub content: Option<String>,
    /// New editorial state name.
    #[serde(default)]
    pub state: Option<String>,
    /// Note stored on the revision written for a content change.
    #[serde(default)]
    pub note: Option<String>,
}

impl CopyEdit {
    /// A content-only edit.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// A state-only edit.
    pub fn state(state: impl Into<String>) -> Self {
        Self {
            state: Some(state.into()),
            ..Self::default()
        }
    }

    /// Attach a revision note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Returns `true` when neither content nor state is supplied.
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.state.is_none()
    }
}
