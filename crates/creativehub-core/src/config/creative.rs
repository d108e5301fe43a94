//! Batch and copy engine configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings for the creative batch engine.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct CreativeConfig {
    /// Model identifier stamped on batches created without an explicit one.
    #[serde(default)]
    pub default_model_id: Option<String>,

    /// Number of copies a full (non single-sequence) batch should produce.
    #[serde(default = "default_expected_copies")]
    #[validate(range(min = 1, max = 5))]
    pub expected_copies: u32,
}

impl Default for CreativeConfig {
    fn default() -> Self {
        Self {
            default_model_id: None,
            expected_copies: default_expected_copies(),
        }
    }
}

fn default_expected_copies() -> u32 {
    5
}
