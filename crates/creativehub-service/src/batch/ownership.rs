//! Asset existence, ownership, and classification checks.
//!
//! Runs inside the batch-creation transaction so the result holds for the
//! snapshot the batch is committed against.

use std::collections::HashMap;

use tracing::{debug, warn};

use creativehub_core::types::{MerchantId, PromptAssetId, ReferenceAssetId};
use creativehub_database::CreativeTx;
use creativehub_entity::asset::{AssetRef, Classification, NewBatchAsset};

use crate::error::{CreativeError, MismatchedAsset};

/// Check that every referenced asset exists for `merchant_id` and carries
/// the classification its role requires.
///
/// Issues at most one query per backing store. Every missing id is
/// reported in a single [`CreativeError::AssetsNotOwned`]; classification
/// problems are only reported once all assets were found.
pub async fn validate_ownership(
    tx: &mut dyn CreativeTx,
    merchant_id: MerchantId,
    assets: &[NewBatchAsset],
) -> Result<(), CreativeError> {
    let mut prompt_ids: Vec<PromptAssetId> = Vec::new();
    let mut reference_ids: Vec<ReferenceAssetId> = Vec::new();
    for asset in assets {
        match asset.asset {
            AssetRef::Prompt(id) if !prompt_ids.contains(&id) => prompt_ids.push(id),
            AssetRef::Reference(id) if !reference_ids.contains(&id) => reference_ids.push(id),
            _ => {}
        }
    }

    let prompts: HashMap<_, _> = if prompt_ids.is_empty() {
        HashMap::new()
    } else {
        tx.find_prompt_assets(merchant_id, &prompt_ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a.asset_type))
            .collect()
    };
    let references: HashMap<_, _> = if reference_ids.is_empty() {
        HashMap::new()
    } else {
        tx.find_reference_assets(merchant_id, &reference_ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a.kind))
            .collect()
    };
    debug!(
        merchant_id = %merchant_id,
        prompt_found = prompts.len(),
        reference_found = references.len(),
        "Loaded assets for ownership check"
    );

    let mut missing = Vec::new();
    let mut mismatches: Vec<MismatchedAsset> = Vec::new();
    for asset in assets {
        let asset_id = asset.asset.asset_id();
        let actual = match asset.asset {
            AssetRef::Prompt(id) => prompts.get(&id).copied().map(Classification::Prompt),
            AssetRef::Reference(id) => references.get(&id).copied().map(Classification::Reference),
        };
        let Some(actual) = actual else {
            if !missing.contains(&asset_id) {
                missing.push(asset_id);
            }
            continue;
        };
        let expected = asset.role.expected_classification();
        if actual != expected {
            let mismatch = MismatchedAsset {
                asset_id,
                role: asset.role,
                expected,
                actual,
            };
            if !mismatches.contains(&mismatch) {
                mismatches.push(mismatch);
            }
        }
    }

    if !missing.is_empty() {
        warn!(merchant_id = %merchant_id, missing = missing.len(), "Rejected assets not owned by merchant");
        return Err(CreativeError::AssetsNotOwned { missing });
    }
    if !mismatches.is_empty() {
        warn!(merchant_id = %merchant_id, mismatched = mismatches.len(), "Rejected misclassified assets");
        return Err(CreativeError::ClassificationMismatch { mismatches });
    }
    Ok(())
}
