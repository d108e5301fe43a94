//! CLI command definitions and dispatch.

pub mod batch;
pub mod copy;
pub mod migrate;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use creativehub::CreativeHub;
use creativehub_core::config::AppConfig;
use creativehub_core::error::AppError;
use creativehub_core::types::UserId;
use creativehub_database::DatabasePool;
use creativehub_service::{AllowAllAccess, RequestContext};

/// CreativeHub: creative batch and copy versioning engine
#[derive(Debug, Parser)]
#[command(name = "creativehub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Batch creation, status, and inspection
    Batch(batch::BatchArgs),
    /// Copy edits and history
    Copy(copy::CopyArgs),
    /// Check that the database is reachable
    Health,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config, self.format).await,
            Commands::Batch(args) => batch::execute(args, config, self.format).await,
            Commands::Copy(args) => copy::execute(args, config, self.format).await,
            Commands::Health => health(config).await,
        }
    }
}

async fn health(config: &AppConfig) -> Result<(), AppError> {
    let (engine, pool) = open_engine(config).await?;
    let healthy = engine.store().health_check().await?;
    pool.close().await;
    if healthy {
        output::print_success("Database reachable.");
        Ok(())
    } else {
        Err(AppError::database("Database health check failed"))
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: connect the engine with operator access
///
/// The CLI is an operator tool, so every merchant is visible.
pub async fn open_engine(config: &AppConfig) -> Result<(CreativeHub, DatabasePool), AppError> {
    CreativeHub::connect(config, Arc::new(AllowAllAccess)).await
}

/// Helper: request context for the acting operator
pub fn operator_context(user: Uuid) -> RequestContext {
    RequestContext::new(UserId::from_uuid(user), "ADMIN")
}
