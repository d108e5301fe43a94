//! Error type for the batch and copy engine.
//!
//! Every rejected precondition is a distinct [`CreativeError`] variant so
//! a caller can tell the categories apart without matching on messages.
//! Errors convert into [`AppError`] for propagation across crates.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use creativehub_core::error::{AppError, ErrorKind};
use creativehub_core::types::{BatchAssetId, BatchId, CopyId, MerchantId};
use creativehub_entity::asset::{AssetRole, Classification};

/// Coarse category of a [`CreativeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Malformed input, rejected before any read.
    Structural,
    /// Referenced assets missing for the merchant or misclassified.
    Ownership,
    /// Parent batch problems and corrupt stored rows.
    ReferentialIntegrity,
    /// The addressed batch or copy does not exist or is not visible.
    NotFound,
    /// The requester may not act for the merchant.
    Forbidden,
    /// Store failure.
    Internal,
}

/// An asset whose stored classification does not fit its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MismatchedAsset {
    /// Offending asset.
    pub asset_id: Uuid,
    /// Role it was placed under.
    pub role: AssetRole,
    /// Classification the role requires.
    pub expected: Classification,
    /// Classification stored on the asset.
    pub actual: Classification,
}

impl fmt::Display for MismatchedAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} as {}: expected {}, found {}",
            self.asset_id, self.role, self.expected, self.actual
        )
    }
}

/// Errors raised by the batch and copy engine.
#[derive(Debug, Error)]
pub enum CreativeError {
    // --- Structural ---
    /// A batch was submitted without any assets.
    #[error("Batch requires at least one asset")]
    EmptyAssets,

    /// A mandatory role does not appear exactly once.
    #[error("Batch must contain exactly one {role} asset, found {count}")]
    RoleCount {
        /// The offending role.
        role: AssetRole,
        /// How many entries carried it.
        count: usize,
    },

    /// An entry carried a negative sort order.
    #[error("Asset at position {index} has negative sort order {sort_order}")]
    NegativeSortOrder {
        /// Position in the submitted list.
        index: usize,
        /// The rejected value.
        sort_order: i32,
    },

    /// A copy edit supplied neither content nor state.
    #[error("Copy edit must include content or state")]
    EmptyEdit,

    /// A copy edit named an unknown state.
    #[error("Unknown copy state: {0}")]
    InvalidCopyState(String),

    /// A status write named an unknown batch status.
    #[error("Unknown batch status: {0}")]
    InvalidStatus(String),

    /// An asset reference could not be parsed.
    #[error("Invalid asset reference: {0}")]
    InvalidAssetId(String),

    // --- Ownership ---
    /// Assets absent from their backing store for the merchant.
    #[error("Assets not found for merchant: {}", join_ids(.missing))]
    AssetsNotOwned {
        /// Every id that was not found.
        missing: Vec<Uuid>,
    },

    /// Assets found but classified differently than their role requires.
    #[error("Asset classification mismatch: {}", join_display(.mismatches))]
    ClassificationMismatch {
        /// One entry per offending asset.
        mismatches: Vec<MismatchedAsset>,
    },

    // --- Referential integrity ---
    /// The parent batch does not exist.
    #[error("Parent batch {0} not found")]
    ParentBatchNotFound(BatchId),

    /// The parent batch belongs to another merchant.
    #[error("Parent batch {parent} does not belong to merchant {merchant}")]
    ParentBatchMerchantMismatch {
        /// The parent batch.
        parent: BatchId,
        /// The merchant creating the child.
        merchant: MerchantId,
    },

    /// A stored batch-asset row does not reference exactly one asset of
    /// the store its role requires.
    #[error("Batch asset {batch_asset_id} is corrupt: asset reference does not match its role")]
    CorruptBatchAsset {
        /// The corrupt row.
        batch_asset_id: BatchAssetId,
    },

    // --- Not found ---
    /// The batch does not exist or is not visible to the caller.
    #[error("Batch {0} not found")]
    BatchNotFound(BatchId),

    /// The copy does not exist or is not visible to the caller.
    #[error("Copy {0} not found")]
    CopyNotFound(CopyId),

    // --- Access ---
    /// The requester may not create work for this merchant.
    #[error("Access to merchant {0} denied")]
    MerchantAccessDenied(MerchantId),

    // --- Store ---
    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] AppError),
}

impl CreativeError {
    /// The category a caller maps to a response.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyAssets
            | Self::RoleCount { .. }
            | Self::NegativeSortOrder { .. }
            | Self::EmptyEdit
            | Self::InvalidCopyState(_)
            | Self::InvalidStatus(_)
            | Self::InvalidAssetId(_) => ErrorCategory::Structural,
            Self::AssetsNotOwned { .. } | Self::ClassificationMismatch { .. } => {
                ErrorCategory::Ownership
            }
            Self::ParentBatchNotFound(_)
            | Self::ParentBatchMerchantMismatch { .. }
            | Self::CorruptBatchAsset { .. } => ErrorCategory::ReferentialIntegrity,
            Self::BatchNotFound(_) | Self::CopyNotFound(_) => ErrorCategory::NotFound,
            Self::MerchantAccessDenied(_) => ErrorCategory::Forbidden,
            Self::Store(_) => ErrorCategory::Internal,
        }
    }
}

impl From<CreativeError> for AppError {
    fn from(err: CreativeError) -> Self {
        let kind = match (&err, err.category()) {
            (CreativeError::CorruptBatchAsset { .. }, _) => ErrorKind::Internal,
            (_, ErrorCategory::Structural | ErrorCategory::Ownership) => ErrorKind::Validation,
            (_, ErrorCategory::ReferentialIntegrity) => ErrorKind::Conflict,
            (_, ErrorCategory::NotFound) => ErrorKind::NotFound,
            (_, ErrorCategory::Forbidden) => ErrorKind::Authorization,
            (_, ErrorCategory::Internal) => ErrorKind::Internal,
        };
        match err {
            CreativeError::Store(inner) => inner,
            other => AppError::new(kind, other.to_string()),
        }
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(T::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
