//! Asset roles and the classification each role requires.
//!
//! | Role | Backing store | Expected classification |
//! |---|---|---|
//! | `REPORT` | prompt asset | `REPORT` |
//! | `PROMPT` | prompt asset | `PROMPT` |
//! | `ATTACHMENT` | reference asset | `RAW_ATTACHMENT` |
//! | `TOPIC` | reference asset | `TOPIC` |
//! | `BENCHMARK` | reference asset | `BENCHMARK` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The functional slot an input asset fills within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "creative_asset_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetRole {
    /// Merchant analysis report (mandatory, exactly one).
    Report,
    /// Generation prompt (mandatory, exactly one).
    Prompt,
    /// Raw attachment material.
    Attachment,
    /// Topic reference.
    Topic,
    /// Benchmark reference.
    Benchmark,
}

/// Which table backs the asset referenced under a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetStore {
    /// `prompt_assets`
    PromptAsset,
    /// `reference_assets`
    ReferenceAsset,
}

/// Stored type of a prompt asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "prompt_asset_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromptAssetType {
    /// Analysis report.
    Report,
    /// Prompt template.
    Prompt,
}

/// Stored kind of a reference asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reference_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceKind {
    /// Uploaded raw material.
    RawAttachment,
    /// Topic notes.
    Topic,
    /// Benchmark copy.
    Benchmark,
}

/// The stored classification of an asset in either backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Classification {
    /// A prompt asset's `type`.
    Prompt(PromptAssetType),
    /// A reference asset's `kind`.
    Reference(ReferenceKind),
}

impl AssetRole {
    /// Every role.
    pub const ALL: [AssetRole; 5] = [
        Self::Report,
        Self::Prompt,
        Self::Attachment,
        Self::Topic,
        Self::Benchmark,
    ];

    /// Roles that must appear exactly once in every batch.
    pub const MANDATORY: [AssetRole; 2] = [Self::Report, Self::Prompt];

    /// The table holding assets referenced under this role.
    pub fn store(&self) -> AssetStore {
        match self {
            Self::Report | Self::Prompt => AssetStore::PromptAsset,
            Self::Attachment | Self::Topic | Self::Benchmark => AssetStore::ReferenceAsset,
        }
    }

    /// The classification an asset must carry to fill this role.
    pub fn expected_classification(&self) -> Classification {
        match self {
            Self::Report => Classification::Prompt(PromptAssetType::Report),
            Self::Prompt => Classification::Prompt(PromptAssetType::Prompt),
            Self::Attachment => Classification::Reference(ReferenceKind::RawAttachment),
            Self::Topic => Classification::Reference(ReferenceKind::Topic),
            Self::Benchmark => Classification::Reference(ReferenceKind::Benchmark),
        }
    }

    /// Return the role as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Report => "REPORT",
            Self::Prompt => "PROMPT",
            Self::Attachment => "ATTACHMENT",
            Self::Topic => "TOPIC",
            Self::Benchmark => "BENCHMARK",
        }
    }
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AssetRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_string())
    }
}

impl PromptAssetType {
    /// Return the type as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Report => "REPORT",
            Self::Prompt => "PROMPT",
        }
    }
}

impl ReferenceKind {
    /// Return the kind as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RawAttachment => "RAW_ATTACHMENT",
            Self::Topic => "TOPIC",
            Self::Benchmark => "BENCHMARK",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prompt(t) => write!(f, "{}", t.as_str()),
            Self::Reference(k) => write!(f, "{}", k.as_str()),
        }
    }
}
