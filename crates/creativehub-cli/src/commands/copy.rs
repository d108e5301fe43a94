//! Copy CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use creativehub_core::config::AppConfig;
use creativehub_core::error::AppError;
use creativehub_core::types::CopyId;
use creativehub_entity::copy::{CopyEdit, CopyRevision, CopyState};
use creativehub_entity::regeneration::RegenerationRequest;

/// Arguments for copy commands
#[derive(Debug, Args)]
pub struct CopyArgs {
    /// Copy subcommand
    #[command(subcommand)]
    pub command: CopyCommand,
}

/// Copy subcommands
#[derive(Debug, Subcommand)]
pub enum CopyCommand {
    /// Show a copy with its revision history
    Show {
        /// Copy ID
        id: Uuid,
    },
    /// Edit a copy's content or state
    Edit {
        /// Copy ID
        id: Uuid,
        /// Acting user
        #[arg(long)]
        user: Uuid,
        /// New content
        #[arg(long)]
        content: Option<String>,
        /// New state (DRAFT, APPROVED, REJECTED, ARCHIVED)
        #[arg(long)]
        state: Option<String>,
        /// Revision note
        #[arg(long, requires = "content")]
        note: Option<String>,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Queue a batch that regenerates this copy only
    Regenerate {
        /// Copy ID
        id: Uuid,
        /// Acting user
        #[arg(long)]
        user: Uuid,
        /// Extra prompt text for the worker
        #[arg(long)]
        append_prompt: Option<String>,
        /// Edited content to start from
        #[arg(long)]
        edited_content: Option<String>,
        /// Note for the worker
        #[arg(long)]
        note: Option<String>,
    },
}

/// Revision display row for table output
#[derive(Debug, Serialize, Tabled)]
struct RevisionRow {
    /// Version
    version: i32,
    /// Source
    source: String,
    /// Author
    author: String,
    /// Note
    note: String,
    /// Created at
    created_at: String,
    /// Content preview
    content: String,
}

impl From<&CopyRevision> for RevisionRow {
    fn from(r: &CopyRevision) -> Self {
        Self {
            version: r.version,
            source: r.source.to_string(),
            author: r.created_by.map(|u| u.to_string()).unwrap_or_default(),
            note: r.note.clone().unwrap_or_default(),
            created_at: r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            content: preview(&r.content),
        }
    }
}

/// Execute copy commands
pub async fn execute(
    args: &CopyArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (engine, pool) = super::open_engine(config).await?;

    match &args.command {
        CopyCommand::Show { id } => {
            let detail = engine.copies.get_copy(CopyId::from_uuid(*id)).await?;
            match format {
                OutputFormat::Json => output::print_item(&detail, format),
                OutputFormat::Table => {
                    output::print_kv("Copy", &detail.copy.id.to_string());
                    output::print_kv("Batch", &detail.batch.id.to_string());
                    output::print_kv("Sequence", &detail.copy.sequence.to_string());
                    output::print_kv("State", detail.copy.state.as_str());
                    output::print_kv("Version", &detail.copy.content_version.to_string());
                    println!();
                    println!("{}", detail.copy.effective_content());
                    println!();
                    let rows: Vec<RevisionRow> =
                        detail.revisions.iter().map(RevisionRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        CopyCommand::Edit {
            id,
            user,
            content,
            state,
            note,
            force,
        } => {
            let archiving = state
                .as_deref()
                .is_some_and(|s| s == CopyState::Archived.as_str());
            if archiving && !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!("Archive copy {id}?"))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;
                if !confirm {
                    println!("Cancelled.");
                    pool.close().await;
                    return Ok(());
                }
            }

            let edit = CopyEdit {
                content: content.clone(),
                state: state.clone(),
                note: note.clone(),
            };
            let ctx = super::operator_context(*user);
            let projection = engine.edit_copy(&ctx, CopyId::from_uuid(*id), &edit).await?;
            match format {
                OutputFormat::Json => output::print_item(&projection, format),
                OutputFormat::Table => {
                    output::print_success(&format!(
                        "Copy {} at version {} ({})",
                        projection.id, projection.content_version, projection.state
                    ));
                }
            }
        }
        CopyCommand::Regenerate {
            id,
            user,
            append_prompt,
            edited_content,
            note,
        } => {
            let request = RegenerationRequest {
                append_prompt: append_prompt.clone(),
                edited_content: edited_content.clone(),
                note: note.clone(),
            };
            let ctx = super::operator_context(*user);
            let ticket = engine
                .regenerate_single_copy(&ctx, CopyId::from_uuid(*id), request)
                .await?;
            match format {
                OutputFormat::Json => output::print_item(&ticket, format),
                OutputFormat::Table => {
                    output::print_success(&format!(
                        "Batch {} queued for sequence {}",
                        ticket.new_batch_id, ticket.target_sequence
                    ));
                }
            }
        }
    }

    pool.close().await;
    Ok(())
}

/// First line of the content, shortened for table cells.
fn preview(content: &str) -> String {
    const WIDTH: usize = 48;
    let line = content.lines().next().unwrap_or_default();
    if line.chars().count() > WIDTH {
        let cut: String = line.chars().take(WIDTH).collect();
        format!("{cut}…")
    } else {
        line.to_string()
    }
}
