//! Metadata carried by single-sequence regeneration batches.

use serde::{Deserialize, Serialize};

use creativehub_core::types::CopyId;

use crate::batch::Batch;

/// `metadata.source` value marking a single-sequence regeneration batch.
pub const COPY_REGENERATE_SOURCE: &str = "copy-regenerate";

/// Metadata key the worker reads to produce a single sequence.
pub const TARGET_SEQUENCE_KEY: &str = "targetSequence";

/// Whether the worker should produce only one copy for `batch`.
///
/// Keyed on the presence of `targetSequence` alone, whatever else the
/// metadata carries.
pub fn is_single_sequence(batch: &Batch) -> bool {
    batch
        .metadata
        .as_ref()
        .is_some_and(|m| m.get(TARGET_SEQUENCE_KEY).is_some())
}

/// The sequence number a single-sequence batch asks for, if it is a valid
/// `i32`.
pub fn target_sequence(batch: &Batch) -> Option<i32> {
    batch
        .metadata
        .as_ref()?
        .get(TARGET_SEQUENCE_KEY)?
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
}

/// Editor input for regenerating one copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationRequest {
    /// Extra instructions appended to the batch prompt.
    #[serde(default)]
    pub append_prompt: Option<String>,
    /// Editor's draft for the worker to start from.
    #[serde(default)]
    pub edited_content: Option<String>,
    /// Editor's note.
    #[serde(default)]
    pub note: Option<String>,
}

/// Metadata stored on a regeneration batch. The worker reads
/// `targetSequence` and produces only that copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationMetadata {
    /// Always [`COPY_REGENERATE_SOURCE`].
    pub source: String,
    /// Copy the editor asked to regenerate.
    pub parent_copy_id: CopyId,
    /// Sequence number the worker should produce.
    pub target_sequence: i32,
    /// Extra prompt text.
    pub append_prompt: Option<String>,
    /// Whether `edited_content` was supplied.
    pub edited_content_provided: bool,
    /// Editor's draft.
    pub edited_content: Option<String>,
    /// Editor's note.
    pub note: Option<String>,
}

impl RegenerationMetadata {
    /// Build the metadata for regenerating `parent_copy_id` at `target_sequence`.
    pub fn new(parent_copy_id: CopyId, target_sequence: i32, request: RegenerationRequest) -> Self {
        Self {
            source: COPY_REGENERATE_SOURCE.to_string(),
            parent_copy_id,
            target_sequence,
            edited_content_provided: request
                .edited_content
                .as_deref()
                .is_some_and(|c| !c.is_empty()),
            append_prompt: request.append_prompt,
            edited_content: request.edited_content,
            note: request.note,
        }
    }

    /// Read regeneration metadata back off a batch.
    ///
    /// Returns `Ok(None)` for batches not marked as copy regenerations, and
    /// an error for a marked batch whose payload does not parse.
    pub fn from_batch(batch: &Batch) -> Result<Option<Self>, serde_json::Error> {
        let Some(value) = batch.metadata.as_ref() else {
            return Ok(None);
        };
        if value.get("source").and_then(|s| s.as_str()) != Some(COPY_REGENERATE_SOURCE) {
            return Ok(None);
        }
        serde_json::from_value(value.clone()).map(Some)
    }

    /// Serialize for the `metadata` column.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "source": self.source,
            "parentCopyId": self.parent_copy_id,
            "targetSequence": self.target_sequence,
            "appendPrompt": self.append_prompt,
            "editedContentProvided": self.edited_content_provided,
            "editedContent": self.edited_content,
            "note": self.note,
        })
    }
}
