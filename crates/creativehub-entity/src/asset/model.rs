//! Asset and batch-asset entity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use creativehub_core::types::{BatchAssetId, BatchId, MerchantId, PromptAssetId, ReferenceAssetId};

use super::role::{AssetRole, AssetStore, PromptAssetType, ReferenceKind};

/// A merchant-scoped prompt asset (reports and prompts).
///
/// Owned by the asset authoring subsystem; read here for ownership checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PromptAsset {
    /// Asset identifier.
    pub id: PromptAssetId,
    /// Owning merchant.
    pub merchant_id: MerchantId,
    /// Stored type.
    pub asset_type: PromptAssetType,
}

/// A merchant-scoped reference asset (attachments, topics, benchmarks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ReferenceAsset {
    /// Asset identifier.
    pub id: ReferenceAssetId,
    /// Owning merchant.
    pub merchant_id: MerchantId,
    /// Stored kind.
    pub kind: ReferenceKind,
}

/// A reference from a batch to exactly one asset in the store its role
/// requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "store", content = "id", rename_all = "snake_case")]
pub enum AssetRef {
    /// A row in `prompt_assets`.
    Prompt(PromptAssetId),
    /// A row in `reference_assets`.
    Reference(ReferenceAssetId),
}

impl AssetRef {
    /// Build the reference for an asset id placed under `role`.
    pub fn for_role(role: AssetRole, asset_id: Uuid) -> Self {
        match role.store() {
            AssetStore::PromptAsset => Self::Prompt(PromptAssetId::from_uuid(asset_id)),
            AssetStore::ReferenceAsset => Self::Reference(ReferenceAssetId::from_uuid(asset_id)),
        }
    }

    /// The raw asset id.
    pub fn asset_id(&self) -> Uuid {
        match self {
            Self::Prompt(id) => id.into_uuid(),
            Self::Reference(id) => id.into_uuid(),
        }
    }

    /// The store this reference points into.
    pub fn store(&self) -> AssetStore {
        match self {
            Self::Prompt(_) => AssetStore::PromptAsset,
            Self::Reference(_) => AssetStore::ReferenceAsset,
        }
    }

    /// The `prompt_asset_id` column value.
    pub fn prompt_asset_id(&self) -> Option<PromptAssetId> {
        match self {
            Self::Prompt(id) => Some(*id),
            Self::Reference(_) => None,
        }
    }

    /// The `reference_asset_id` column value.
    pub fn reference_asset_id(&self) -> Option<ReferenceAssetId> {
        match self {
            Self::Reference(id) => Some(*id),
            Self::Prompt(_) => None,
        }
    }
}

/// One entry of a caller-supplied batch asset list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAssetInput {
    /// Slot the asset fills.
    pub role: AssetRole,
    /// Asset id, interpreted against the store `role` requires.
    pub asset_id: Uuid,
    /// Defaults to `true`.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Defaults to the entry's position in the list.
    #[serde(default)]
    pub sort_order: Option<i32>,
}

impl BatchAssetInput {
    /// An enabled entry with positional ordering.
    pub fn new(role: AssetRole, asset_id: Uuid) -> Self {
        Self {
            role,
            asset_id,
            enabled: None,
            sort_order: None,
        }
    }

    /// Set an explicit sort order.
    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    /// Set the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }
}

/// Raw `batch_assets` row as stored, with both nullable foreign keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BatchAssetRow {
    /// Row identifier.
    pub id: BatchAssetId,
    /// Owning batch.
    pub batch_id: BatchId,
    /// Slot the asset fills.
    pub role: AssetRole,
    /// Set for `REPORT` and `PROMPT` rows.
    pub prompt_asset_id: Option<PromptAssetId>,
    /// Set for `ATTACHMENT`, `TOPIC` and `BENCHMARK` rows.
    pub reference_asset_id: Option<ReferenceAssetId>,
    /// Whether the worker should use this asset.
    pub is_enabled: bool,
    /// Explicit ordering, written at insert time.
    pub sort_order: i32,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
}

impl BatchAssetRow {
    /// Resolve the row into a typed [`BatchAsset`].
    ///
    /// Returns `None` when neither or both foreign keys are set, or when the
    /// populated key does not belong to the store the role requires.
    pub fn into_asset(self) -> Option<BatchAsset> {
        let asset = match (self.prompt_asset_id, self.reference_asset_id) {
            (Some(id), None) => AssetRef::Prompt(id),
            (None, Some(id)) => AssetRef::Reference(id),
            _ => return None,
        };
        if asset.store() != self.role.store() {
            return None;
        }
        Some(BatchAsset {
            id: self.id,
            batch_id: self.batch_id,
            role: self.role,
            asset,
            is_enabled: self.is_enabled,
            sort_order: self.sort_order,
            created_at: self.created_at,
        })
    }
}

/// A batch-to-asset association with the foreign key resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAsset {
    /// Row identifier.
    pub id: BatchAssetId,
    /// Owning batch.
    pub batch_id: BatchId,
    /// Slot the asset fills.
    pub role: AssetRole,
    /// Referenced asset.
    pub asset: AssetRef,
    /// Whether the worker should use this asset.
    pub is_enabled: bool,
    /// Explicit ordering.
    pub sort_order: i32,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
}

impl BatchAsset {
    /// Rebuild the input entry that would recreate this association.
    pub fn to_input(&self) -> BatchAssetInput {
        BatchAssetInput {
            role: self.role,
            asset_id: self.asset.asset_id(),
            enabled: Some(self.is_enabled),
            sort_order: Some(self.sort_order),
        }
    }

    /// Convert back into the stored row shape.
    pub fn to_row(&self) -> BatchAssetRow {
        BatchAssetRow {
            id: self.id,
            batch_id: self.batch_id,
            role: self.role,
            prompt_asset_id: self.asset.prompt_asset_id(),
            reference_asset_id: self.asset.reference_asset_id(),
            is_enabled: self.is_enabled,
            sort_order: self.sort_order,
            created_at: self.created_at,
        }
    }
}

/// Data required to insert one `batch_assets` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBatchAsset {
    /// Slot the asset fills.
    pub role: AssetRole,
    /// Referenced asset.
    pub asset: AssetRef,
    /// Whether the worker should use this asset.
    pub is_enabled: bool,
    /// Explicit ordering.
    pub sort_order: i32,
}

impl NewBatchAsset {
    /// Build the row for the entry at `index` of a caller's list.
    pub fn from_input(input: &BatchAssetInput, index: usize) -> Self {
        Self {
            role: input.role,
            asset: AssetRef::for_role(input.role, input.asset_id),
            is_enabled: input.enabled.unwrap_or(true),
            sort_order: input.sort_order.unwrap_or(index as i32),
        }
    }
}
