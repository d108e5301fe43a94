//! # creativehub
//!
//! Creative batch and copy versioning engine.
//!
//! [`CreativeHub`] wires a store, an access predicate, and engine settings
//! into the batch, copy, and regeneration services, and puts the merchant
//! access check in front of every operation a user triggers.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use creativehub_core::config::{AppConfig, CreativeConfig, LoggingConfig};
use creativehub_core::error::AppError;
use creativehub_core::types::{BatchId, CopyId};
use creativehub_database::{CreativeStore, DatabasePool};
use creativehub_entity::batch::{Batch, StatusUpdate};
use creativehub_entity::copy::{CopyEdit, CopyProjection};
use creativehub_entity::regeneration::RegenerationRequest;
use creativehub_service::{
    AccessGuard, BatchDetail, BatchService, CopyDetail, CopyService, CreateBatchRequest,
    CreatedBatch, CreativeError, MerchantAccess, RegenerationService, RegenerationTicket,
    RequestContext,
};

pub use creativehub_core as core;
pub use creativehub_database as database;
pub use creativehub_entity as entity;
pub use creativehub_service as service;

/// The assembled engine.
#[derive(Debug, Clone)]
pub struct CreativeHub {
    /// Batch creation and status writes.
    pub batches: BatchService,
    /// Copy edits and history.
    pub copies: CopyService,
    /// Regeneration batches.
    pub regeneration: RegenerationService,
    /// Merchant access checks.
    pub access: AccessGuard,
    /// Shared store.
    store: Arc<dyn CreativeStore>,
}

impl CreativeHub {
    /// Assemble the engine over an existing store.
    pub fn new(
        store: Arc<dyn CreativeStore>,
        access: Arc<dyn MerchantAccess>,
        config: CreativeConfig,
    ) -> Self {
        let batches = BatchService::new(store.clone(), config);
        Self {
            copies: CopyService::new(store.clone()),
            regeneration: RegenerationService::new(store.clone(), batches.clone()),
            access: AccessGuard::new(access, store.clone()),
            batches,
            store,
        }
    }

    /// Connect to PostgreSQL and assemble the engine.
    ///
    /// Returns the pool as well so the caller can run migrations or close it.
    pub async fn connect(
        config: &AppConfig,
        access: Arc<dyn MerchantAccess>,
    ) -> Result<(Self, DatabasePool), AppError> {
        let pool = DatabasePool::connect(&config.database).await?;
        let store: Arc<dyn CreativeStore> = Arc::new(pool.creative_store());
        info!("Creative engine ready");
        Ok((Self::new(store, access, config.creative.clone()), pool))
    }

    /// The store the services share.
    pub fn store(&self) -> &Arc<dyn CreativeStore> {
        &self.store
    }

    /// Create a batch on behalf of the requesting user.
    pub async fn create_batch(
        &self,
        ctx: &RequestContext,
        mut request: CreateBatchRequest,
    ) -> Result<CreatedBatch, CreativeError> {
        self.access.authorize_merchant(ctx, request.merchant_id).await?;
        request.triggered_by = ctx.user_id;
        self.batches.create_batch(request).await
    }

    /// Worker status write. The worker is trusted and not access-checked.
    pub async fn update_batch_status(&self, update: &StatusUpdate) -> Result<Batch, CreativeError> {
        self.batches.update_batch_status(update).await
    }

    /// Load a batch the requester may see.
    pub async fn get_batch_detail(
        &self,
        ctx: &RequestContext,
        batch_id: BatchId,
    ) -> Result<BatchDetail, CreativeError> {
        self.access.authorize_batch(ctx, batch_id).await?;
        self.batches.get_batch_detail(batch_id).await
    }

    /// Load a copy the requester may see.
    pub async fn get_copy(
        &self,
        ctx: &RequestContext,
        copy_id: CopyId,
    ) -> Result<CopyDetail, CreativeError> {
        self.access.authorize_copy(ctx, copy_id).await?;
        self.copies.get_copy(copy_id).await
    }

    /// Edit a copy the requester may access.
    pub async fn edit_copy(
        &self,
        ctx: &RequestContext,
        copy_id: CopyId,
        edit: &CopyEdit,
    ) -> Result<CopyProjection, CreativeError> {
        self.access.authorize_copy(ctx, copy_id).await?;
        self.copies.edit_copy(ctx, copy_id, edit).await
    }

    /// Regenerate one copy the requester may access.
    pub async fn regenerate_single_copy(
        &self,
        ctx: &RequestContext,
        copy_id: CopyId,
        request: RegenerationRequest,
    ) -> Result<RegenerationTicket, CreativeError> {
        self.access.authorize_copy(ctx, copy_id).await?;
        self.regeneration
            .regenerate_single_copy(ctx, copy_id, request)
            .await
    }

    /// Regenerate a whole batch the requester may access.
    pub async fn regenerate_batch(
        &self,
        ctx: &RequestContext,
        batch_id: BatchId,
    ) -> Result<CreatedBatch, CreativeError> {
        self.access.authorize_batch(ctx, batch_id).await?;
        self.regeneration.regenerate_batch(ctx, batch_id).await
    }
}

/// Initialize tracing from the logging section.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}
