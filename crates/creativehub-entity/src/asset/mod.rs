//! Input asset domain entities.

pub mod model;
pub mod role;

pub use model::{
    AssetRef, BatchAsset, BatchAssetInput, BatchAssetRow, NewBatchAsset, PromptAsset,
    ReferenceAsset,
};
pub use role::{AssetRole, AssetStore, Classification, PromptAssetType, ReferenceKind};
