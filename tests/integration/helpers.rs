//! Shared test helpers for integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use creativehub::CreativeHub;
use creativehub::core::config::{AppConfig, CreativeConfig};
use creativehub::core::result::AppResult;
use creativehub::core::types::{BatchId, CopyId, MerchantId, UserId};
use creativehub::database::migration::run_migrations;
use creativehub::database::{CreativeStore, DatabasePool, MemoryCreativeStore, PgCreativeStore};
use creativehub::entity::asset::{AssetRole, BatchAssetInput, PromptAssetType, ReferenceKind};
use creativehub::entity::copy::RevisionSource;
use creativehub::service::{
    AllowAllAccess, CreateBatchRequest, CreatedBatch, MerchantAccess, RequestContext,
};

/// Grants each listed user access to exactly one merchant.
#[derive(Debug, Default)]
pub struct Membership {
    /// `(user, merchant)` pairs.
    pub grants: Vec<(UserId, MerchantId)>,
}

#[async_trait]
impl MerchantAccess for Membership {
    async fn has_access(
        &self,
        user_id: UserId,
        merchant_id: MerchantId,
        _role: &str,
    ) -> AppResult<bool> {
        Ok(self.grants.contains(&(user_id, merchant_id)))
    }
}

/// One merchant's seeded assets.
#[derive(Debug, Clone, Copy)]
pub struct Assets {
    pub report: Uuid,
    pub prompt: Uuid,
    pub attachment: Uuid,
    pub topic: Uuid,
    pub benchmark: Uuid,
}

impl Assets {
    /// REPORT, PROMPT, and ATTACHMENT in that order.
    pub fn standard(&self) -> Vec<BatchAssetInput> {
        vec![
            BatchAssetInput::new(AssetRole::Report, self.report),
            BatchAssetInput::new(AssetRole::Prompt, self.prompt),
            BatchAssetInput::new(AssetRole::Attachment, self.attachment),
        ]
    }
}

/// Test application context
pub struct TestApp {
    /// The assembled engine
    pub engine: CreativeHub,
    /// Store handle for seeding and inspection
    pub store: MemoryCreativeStore,
    /// Merchant the acting user belongs to
    pub merchant: MerchantId,
    /// Acting user
    pub ctx: RequestContext,
}

impl TestApp {
    /// An engine where every request is allowed
    pub fn new() -> Self {
        Self::build(|_, _| Arc::new(AllowAllAccess))
    }

    /// An engine where the acting user may only access their own merchant
    pub fn with_membership() -> Self {
        Self::build(|user, merchant| {
            Arc::new(Membership {
                grants: vec![(user, merchant)],
            })
        })
    }

    fn build(access: impl FnOnce(UserId, MerchantId) -> Arc<dyn MerchantAccess>) -> Self {
        let store = MemoryCreativeStore::new();
        let merchant = MerchantId::new();
        let ctx = RequestContext::new(UserId::new(), "USER");
        let shared: Arc<dyn CreativeStore> = Arc::new(store.clone());
        let engine = CreativeHub::new(shared, access(ctx.user_id, merchant), CreativeConfig::default());
        Self {
            engine,
            store,
            merchant,
            ctx,
        }
    }

    /// Seed one asset of every classification for `merchant`
    pub async fn seed_assets(&self, merchant: MerchantId) -> Assets {
        Assets {
            report: self
                .store
                .insert_prompt_asset(merchant, PromptAssetType::Report)
                .await
                .into_uuid(),
            prompt: self
                .store
                .insert_prompt_asset(merchant, PromptAssetType::Prompt)
                .await
                .into_uuid(),
            attachment: self
                .store
                .insert_reference_asset(merchant, ReferenceKind::RawAttachment)
                .await
                .into_uuid(),
            topic: self
                .store
                .insert_reference_asset(merchant, ReferenceKind::Topic)
                .await
                .into_uuid(),
            benchmark: self
                .store
                .insert_reference_asset(merchant, ReferenceKind::Benchmark)
                .await
                .into_uuid(),
        }
    }

    /// Create a standard batch for the acting merchant
    pub async fn create_batch(&self, assets: &Assets) -> CreatedBatch {
        self.engine
            .create_batch(
                &self.ctx,
                CreateBatchRequest::new(self.merchant, self.ctx.user_id, assets.standard()),
            )
            .await
            .expect("Failed to create batch")
    }

    /// Create a batch and let the worker write `count` copies into it
    pub async fn create_generated_batch(&self, count: i32) -> CreatedBatch {
        let assets = self.seed_assets(self.merchant).await;
        let created = self.create_batch(&assets).await;
        for sequence in 1..=count {
            self.store
                .insert_copy(created.batch.id, sequence, &format!("model copy {sequence}"))
                .await
                .expect("Failed to insert copy");
        }
        created
    }
}

/// Environment variable naming a scratch PostgreSQL database for tests.
pub const TEST_DATABASE_URL: &str = "CREATIVEHUB_TEST_DATABASE_URL";

/// Test application context over PostgreSQL
pub struct PgTestApp {
    /// The assembled engine
    pub engine: CreativeHub,
    /// Store handle for opening raw transactions
    pub store: PgCreativeStore,
    /// Database pool for direct queries
    pub db_pool: PgPool,
    /// Merchant the acting user belongs to
    pub merchant: MerchantId,
    /// Acting user
    pub ctx: RequestContext,
}

impl PgTestApp {
    /// Connect and migrate, or `None` when no test database is configured
    pub async fn connect() -> Option<Self> {
        let Ok(url) = std::env::var(TEST_DATABASE_URL) else {
            eprintln!("{TEST_DATABASE_URL} not set, skipping PostgreSQL test");
            return None;
        };

        let mut config =
            AppConfig::load("config/default.toml").expect("Failed to load test config");
        config.database.url = url;

        let pool = DatabasePool::connect(&config.database)
            .await
            .expect("Failed to connect to test database");
        run_migrations(pool.pool())
            .await
            .expect("Failed to run migrations");

        let store = pool.creative_store();
        let shared: Arc<dyn CreativeStore> = Arc::new(store.clone());
        let engine = CreativeHub::new(shared, Arc::new(AllowAllAccess), config.creative.clone());

        Some(Self {
            engine,
            store,
            db_pool: pool.pool().clone(),
            merchant: MerchantId::new(),
            ctx: RequestContext::new(UserId::new(), "USER"),
        })
    }

    /// Seed one asset of every classification for `merchant`
    pub async fn seed_assets(&self, merchant: MerchantId) -> Assets {
        Assets {
            report: self.insert_prompt_asset(merchant, PromptAssetType::Report).await,
            prompt: self.insert_prompt_asset(merchant, PromptAssetType::Prompt).await,
            attachment: self
                .insert_reference_asset(merchant, ReferenceKind::RawAttachment)
                .await,
            topic: self.insert_reference_asset(merchant, ReferenceKind::Topic).await,
            benchmark: self
                .insert_reference_asset(merchant, ReferenceKind::Benchmark)
                .await,
        }
    }

    async fn insert_prompt_asset(&self, merchant: MerchantId, asset_type: PromptAssetType) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO prompt_assets (id, merchant_id, asset_type) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(merchant)
            .bind(asset_type)
            .execute(&self.db_pool)
            .await
            .expect("Failed to seed prompt asset");
        id
    }

    async fn insert_reference_asset(&self, merchant: MerchantId, kind: ReferenceKind) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO reference_assets (id, merchant_id, kind) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(merchant)
            .bind(kind)
            .execute(&self.db_pool)
            .await
            .expect("Failed to seed reference asset");
        id
    }

    /// Create a standard batch for the acting merchant
    pub async fn create_batch(&self, assets: &Assets) -> CreatedBatch {
        self.engine
            .create_batch(
                &self.ctx,
                CreateBatchRequest::new(self.merchant, self.ctx.user_id, assets.standard()),
            )
            .await
            .expect("Failed to create batch")
    }

    /// Write a worker copy with its MODEL revision
    pub async fn insert_copy(&self, batch_id: BatchId, sequence: i32, content: &str) -> CopyId {
        let id = CopyId::new();
        let mut tx = self.db_pool.begin().await.expect("Failed to begin");
        sqlx::query(
            "INSERT INTO creative_copies (id, batch_id, sequence, markdown_content) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(batch_id)
        .bind(sequence)
        .bind(content)
        .execute(&mut *tx)
        .await
        .expect("Failed to insert copy");
        sqlx::query(
            "INSERT INTO creative_copy_revisions (id, copy_id, version, content, source) \
             VALUES ($1, $2, 1, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(content)
        .bind(RevisionSource::Model)
        .execute(&mut *tx)
        .await
        .expect("Failed to insert revision");
        tx.commit().await.expect("Failed to commit");
        id
    }

    /// Number of batches stored for `merchant`
    pub async fn batch_count(&self, merchant: MerchantId) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM creative_batches WHERE merchant_id = $1")
            .bind(merchant)
            .fetch_one(&self.db_pool)
            .await
            .expect("Failed to count batches")
    }
}
