//! Batch CLI commands.

use chrono::Utc;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use creativehub_core::config::AppConfig;
use creativehub_core::error::AppError;
use creativehub_core::types::{BatchId, MerchantId, UserId};
use creativehub_entity::asset::{AssetRole, BatchAsset, BatchAssetInput};
use creativehub_entity::batch::{Batch, BatchStatus, StatusUpdate};
use creativehub_service::{
    BatchCopy, CreateBatchRequest, CreativeError, completion_update, failure_update,
};

/// Arguments for batch commands
#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Batch subcommand
    #[command(subcommand)]
    pub command: BatchCommand,
}

/// Batch subcommands
#[derive(Debug, Subcommand)]
pub enum BatchCommand {
    /// Create a batch from existing assets
    Create {
        /// Owning merchant
        #[arg(long)]
        merchant: Uuid,
        /// Acting user
        #[arg(long)]
        user: Uuid,
        /// Asset as ROLE:ID[:SORT_ORDER][:off], repeatable
        #[arg(long = "asset", required = true)]
        assets: Vec<String>,
        /// Parent batch
        #[arg(long)]
        parent: Option<Uuid>,
        /// Model override
        #[arg(long)]
        model: Option<String>,
    },
    /// Show a batch with its assets and copies
    Show {
        /// Batch ID
        id: Uuid,
    },
    /// Write a worker status update
    Status {
        /// Batch ID
        id: Uuid,
        /// New status (QUEUED, RUNNING, SUCCEEDED, PARTIAL_SUCCESS, FAILED)
        status: String,
        /// Stamp started_at with the current time
        #[arg(long)]
        started: bool,
        /// Stamp completed_at with the current time
        #[arg(long)]
        completed: bool,
        /// Error code
        #[arg(long, requires = "error_message", conflicts_with = "clear_error")]
        error_code: Option<String>,
        /// Error message
        #[arg(long, requires = "error_code")]
        error_message: Option<String>,
        /// Clear both error columns
        #[arg(long)]
        clear_error: bool,
        /// Token usage as a JSON document
        #[arg(long)]
        token_usage: Option<String>,
        /// Only apply if the batch is still at this status version
        #[arg(long)]
        expected_version: Option<i32>,
    },
    /// Finish a batch from the number of copies it produced
    Complete {
        /// Batch ID
        id: Uuid,
        /// Token usage as a JSON document
        #[arg(long)]
        token_usage: Option<String>,
    },
    /// Mark a batch as failed
    Fail {
        /// Batch ID
        id: Uuid,
        /// Error code
        #[arg(long)]
        code: String,
        /// Error message
        #[arg(long)]
        message: String,
    },
    /// Queue a batch that regenerates every copy of this one
    Regenerate {
        /// Source batch ID
        id: Uuid,
        /// Acting user
        #[arg(long)]
        user: Uuid,
    },
}

/// Batch display row for table output
#[derive(Debug, Serialize, Tabled)]
struct BatchRow {
    /// Batch ID
    id: String,
    /// Merchant
    merchant: String,
    /// Parent
    parent: String,
    /// Status
    status: String,
    /// Status version
    version: i32,
    /// Model
    model: String,
    /// Created at
    created_at: String,
}

impl From<&Batch> for BatchRow {
    fn from(b: &Batch) -> Self {
        Self {
            id: b.id.to_string(),
            merchant: b.merchant_id.to_string(),
            parent: b.parent_batch_id.map(|p| p.to_string()).unwrap_or_default(),
            status: b.status.to_string(),
            version: b.status_version,
            model: b.model_id.clone().unwrap_or_default(),
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Batch asset display row
#[derive(Debug, Serialize, Tabled)]
struct AssetRow {
    /// Role
    role: String,
    /// Asset ID
    asset: String,
    /// Store
    store: String,
    /// Enabled
    enabled: bool,
    /// Sort order
    sort: i32,
}

impl From<&BatchAsset> for AssetRow {
    fn from(a: &BatchAsset) -> Self {
        Self {
            role: a.role.to_string(),
            asset: a.asset.asset_id().to_string(),
            store: format!("{:?}", a.asset.store()),
            enabled: a.is_enabled,
            sort: a.sort_order,
        }
    }
}

/// Copy display row
#[derive(Debug, Serialize, Tabled)]
struct CopyRow {
    /// Copy ID
    id: String,
    /// Sequence
    seq: i32,
    /// State
    state: String,
    /// Content version
    version: i32,
    /// Edited
    edited: bool,
    /// Regenerations
    regenerations: usize,
}

impl From<&BatchCopy> for CopyRow {
    fn from(c: &BatchCopy) -> Self {
        Self {
            id: c.copy.id.to_string(),
            seq: c.copy.sequence,
            state: c.copy.state.to_string(),
            version: c.copy.content_version,
            edited: c.copy.user_override.is_some(),
            regenerations: c.regeneration_ids.len(),
        }
    }
}

/// Execute batch commands
pub async fn execute(
    args: &BatchArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (engine, pool) = super::open_engine(config).await?;

    match &args.command {
        BatchCommand::Create {
            merchant,
            user,
            assets,
            parent,
            model,
        } => {
            let inputs = assets
                .iter()
                .map(|spec| parse_asset(spec))
                .collect::<Result<Vec<_>, _>>()?;
            let mut request = CreateBatchRequest::new(
                MerchantId::from_uuid(*merchant),
                UserId::from_uuid(*user),
                inputs,
            );
            request.parent_batch_id = parent.map(BatchId::from_uuid);
            request.model_id = model.clone();

            let ctx = super::operator_context(*user);
            let created = engine.create_batch(&ctx, request).await?;
            match format {
                OutputFormat::Json => output::print_item(&created, format),
                OutputFormat::Table => {
                    output::print_success(&format!("Batch {} created", created.batch.id));
                    output::print_list(&[BatchRow::from(&created.batch)], format);
                    let rows: Vec<AssetRow> = created.assets.iter().map(AssetRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        BatchCommand::Show { id } => {
            let detail = engine.batches.get_batch_detail(BatchId::from_uuid(*id)).await?;
            match format {
                OutputFormat::Json => output::print_item(&detail, format),
                OutputFormat::Table => {
                    output::print_list(&[BatchRow::from(&detail.batch)], format);
                    if let Some(code) = &detail.batch.error_code {
                        output::print_kv(
                            "Error",
                            &format!("{code}: {}", detail.batch.error_message.as_deref().unwrap_or("")),
                        );
                    }
                    println!("Assets:");
                    let assets: Vec<AssetRow> = detail.assets.iter().map(AssetRow::from).collect();
                    output::print_list(&assets, format);
                    println!("Copies:");
                    let copies: Vec<CopyRow> = detail.copies.iter().map(CopyRow::from).collect();
                    output::print_list(&copies, format);
                }
            }
        }
        BatchCommand::Status {
            id,
            status,
            started,
            completed,
            error_code,
            error_message,
            clear_error,
            token_usage,
            expected_version,
        } => {
            let status: BatchStatus = status.parse().map_err(CreativeError::InvalidStatus)?;
            let now = Utc::now();
            let mut update = StatusUpdate::new(BatchId::from_uuid(*id), status);
            if *started {
                update = update.started_at(now);
            }
            if *completed {
                update = update.completed_at(now);
            }
            if let (Some(code), Some(message)) = (error_code, error_message) {
                update = update.error(code.as_str(), message.as_str());
            }
            if *clear_error {
                update = update.clear_error();
            }
            if let Some(raw) = token_usage {
                update = update.token_usage(parse_json(raw)?);
            }

            match expected_version {
                Some(expected) => {
                    match engine.batches.update_batch_status_if(&update, *expected).await? {
                        Some(batch) => print_batch(&batch, format),
                        None => output::print_warning(&format!(
                            "Batch {id} is not at status version {expected}; nothing written"
                        )),
                    }
                }
                None => {
                    let batch = engine.update_batch_status(&update).await?;
                    print_batch(&batch, format);
                }
            }
        }
        BatchCommand::Complete { id, token_usage } => {
            let detail = engine.batches.get_batch_detail(BatchId::from_uuid(*id)).await?;
            let usage = token_usage.as_deref().map(parse_json).transpose()?;
            let update = completion_update(
                &detail.batch,
                detail.copies.len(),
                engine.batches.config().expected_copies,
                Utc::now(),
                usage,
            );
            let batch = engine.update_batch_status(&update).await?;
            print_batch(&batch, format);
        }
        BatchCommand::Fail { id, code, message } => {
            let update = failure_update(BatchId::from_uuid(*id), code, message, Utc::now());
            let batch = engine.update_batch_status(&update).await?;
            print_batch(&batch, format);
        }
        BatchCommand::Regenerate { id, user } => {
            let ctx = super::operator_context(*user);
            let created = engine.regenerate_batch(&ctx, BatchId::from_uuid(*id)).await?;
            match format {
                OutputFormat::Json => output::print_item(&created, format),
                OutputFormat::Table => {
                    output::print_success(&format!(
                        "Batch {} queued from {id}",
                        created.batch.id
                    ));
                    output::print_list(&[BatchRow::from(&created.batch)], format);
                }
            }
        }
    }

    pool.close().await;
    Ok(())
}

fn print_batch(batch: &Batch, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_item(batch, format),
        OutputFormat::Table => output::print_list(&[BatchRow::from(batch)], format),
    }
}

/// Parse `ROLE:ID[:SORT_ORDER][:off]` into an asset input.
fn parse_asset(spec: &str) -> Result<BatchAssetInput, CreativeError> {
    let mut parts = spec.split(':');
    let role = parts.next().unwrap_or_default();
    let role: AssetRole = role
        .parse()
        .map_err(|_| CreativeError::InvalidAssetId(format!("{spec}: unknown role {role}")))?;
    let id = parts.next().unwrap_or_default();
    let id = Uuid::parse_str(id).map_err(|_| CreativeError::InvalidAssetId(id.to_string()))?;

    let mut input = BatchAssetInput::new(role, id);
    for part in parts {
        if part.eq_ignore_ascii_case("off") {
            input = input.with_enabled(false);
        } else {
            let sort_order = part
                .parse::<i32>()
                .map_err(|_| CreativeError::InvalidAssetId(format!("{spec}: bad sort order {part}")))?;
            input = input.with_sort_order(sort_order);
        }
    }
    Ok(input)
}

fn parse_json(raw: &str) -> Result<serde_json::Value, AppError> {
    serde_json::from_str(raw).map_err(|e| AppError::validation(format!("Invalid JSON: {e}")))
}
