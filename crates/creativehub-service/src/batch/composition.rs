//! Structural checks on a submitted asset list.

use creativehub_entity::asset::{AssetRole, BatchAssetInput};

use crate::error::CreativeError;

/// Verify the shape of an asset list before anything is read.
///
/// The list must be non-empty, carry every mandatory role exactly once
/// (enabled or not), and use only non-negative explicit sort orders.
/// Optional roles may appear any number of times.
pub fn validate_composition(assets: &[BatchAssetInput]) -> Result<(), CreativeError> {
    if assets.is_empty() {
        return Err(CreativeError::EmptyAssets);
    }

    for role in AssetRole::MANDATORY {
        let count = assets.iter().filter(|a| a.role == role).count();
        if count != 1 {
            return Err(CreativeError::RoleCount { role, count });
        }
    }

    for (index, asset) in assets.iter().enumerate() {
        if let Some(sort_order) = asset.sort_order.filter(|s| *s < 0) {
            return Err(CreativeError::NegativeSortOrder { index, sort_order });
        }
    }

    Ok(())
}
