//! Merchant access checks in front of the engine's operations.
//!
//! Access control is owned by another subsystem; the engine only needs
//! the [`MerchantAccess`] predicate. A denied check is reported the same
//! way as a missing row so callers cannot probe for ids of other merchants.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use creativehub_core::result::AppResult;
use creativehub_core::types::{BatchId, CopyId, MerchantId, UserId};
use creativehub_database::CreativeStore;

use crate::context::RequestContext;
use crate::error::CreativeError;

/// Decides whether a user may act on a merchant's data.
#[async_trait]
pub trait MerchantAccess: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `user_id` holding `role` may access `merchant_id`.
    async fn has_access(&self, user_id: UserId, merchant_id: MerchantId, role: &str)
    -> AppResult<bool>;
}

/// Grants every request. For trusted operator tooling only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllAccess;

#[async_trait]
impl MerchantAccess for AllowAllAccess {
    async fn has_access(&self, _: UserId, _: MerchantId, _: &str) -> AppResult<bool> {
        Ok(true)
    }
}

/// Resolves the merchant behind a batch or copy and checks access to it.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    /// Access predicate.
    access: Arc<dyn MerchantAccess>,
    /// Store used to resolve owning merchants.
    store: Arc<dyn CreativeStore>,
}

impl AccessGuard {
    /// Creates a new access guard.
    pub fn new(access: Arc<dyn MerchantAccess>, store: Arc<dyn CreativeStore>) -> Self {
        Self { access, store }
    }

    /// Check `ctx` may access `merchant_id`.
    pub async fn can_access(
        &self,
        ctx: &RequestContext,
        merchant_id: MerchantId,
    ) -> Result<bool, CreativeError> {
        Ok(self
            .access
            .has_access(ctx.user_id, merchant_id, &ctx.role)
            .await?)
    }

    /// Authorize new work for `merchant_id`.
    ///
    /// Nothing is addressed by id yet, so a denial is reported as such.
    pub async fn authorize_merchant(
        &self,
        ctx: &RequestContext,
        merchant_id: MerchantId,
    ) -> Result<(), CreativeError> {
        if !self.can_access(ctx, merchant_id).await? {
            warn!(user_id = %ctx.user_id, merchant_id = %merchant_id, "Merchant access denied");
            return Err(CreativeError::MerchantAccessDenied(merchant_id));
        }
        Ok(())
    }

    /// Authorize access to a batch, returning its merchant.
    ///
    /// Fails with [`CreativeError::BatchNotFound`] when the batch is
    /// missing or access is denied.
    pub async fn authorize_batch(
        &self,
        ctx: &RequestContext,
        batch_id: BatchId,
    ) -> Result<MerchantId, CreativeError> {
        let mut tx = self.store.begin().await?;
        let merchant_id = tx
            .find_batch(batch_id)
            .await?
            .map(|b| b.merchant_id)
            .ok_or(CreativeError::BatchNotFound(batch_id))?;
        tx.commit().await?;

        if !self.can_access(ctx, merchant_id).await? {
            warn!(user_id = %ctx.user_id, batch_id = %batch_id, "Batch access denied");
            return Err(CreativeError::BatchNotFound(batch_id));
        }
        Ok(merchant_id)
    }

    /// Authorize access to a copy through its batch's merchant.
    ///
    /// Fails with [`CreativeError::CopyNotFound`] when the copy is missing
    /// or access is denied.
    pub async fn authorize_copy(
        &self,
        ctx: &RequestContext,
        copy_id: CopyId,
    ) -> Result<MerchantId, CreativeError> {
        let mut tx = self.store.begin().await?;
        let copy = tx
            .find_copy(copy_id)
            .await?
            .ok_or(CreativeError::CopyNotFound(copy_id))?;
        let merchant_id = tx
            .find_batch(copy.batch_id)
            .await?
            .map(|b| b.merchant_id)
            .ok_or(CreativeError::CopyNotFound(copy_id))?;
        tx.commit().await?;

        if !self.can_access(ctx, merchant_id).await? {
            warn!(user_id = %ctx.user_id, copy_id = %copy_id, "Copy access denied");
            return Err(CreativeError::CopyNotFound(copy_id));
        }
        Ok(merchant_id)
    }
}
