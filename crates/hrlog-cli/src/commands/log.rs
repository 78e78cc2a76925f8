//! Log inspection and maintenance commands

use super::{CliResult, GlobalArgs};
use clap::{Args, Subcommand};
use hrlog_core::diff::render_human_summary;
use hrlog_core::model::{FieldValue, RecordSnapshot};
use hrlog_core::queries::{export, statistics};
use hrlog_core::service::CREATED_AT_FIELD;
use hrlog_core::{AuditLogStore, Clock, SystemClock};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct LogArgs {
    #[command(subcommand)]
    pub command: LogCommand,
}

#[derive(Debug, Subcommand)]
pub enum LogCommand {
    /// Print one entity's history, newest first
    Show(ShowArgs),
    /// Forget one entity's history
    Clear(ClearArgs),
    /// Forget every entity's history
    ClearAll,
    /// Print totals and recent activity as JSON
    Stats,
    /// Print a digest-stamped JSON export
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(long)]
    pub entity: String,

    /// Print entries as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Creation timestamp shown when the entity has no history yet
    #[arg(long)]
    pub created_at: Option<String>,
}

#[derive(Debug, Args)]
pub struct ClearArgs {
    #[arg(long)]
    pub entity: String,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Export only this entity; every entity when omitted
    #[arg(long)]
    pub entity: Option<String>,

    /// Write to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn execute(global: &GlobalArgs, args: LogArgs) -> CliResult {
    match args.command {
        LogCommand::Show(show) => execute_show(global, show),
        LogCommand::Clear(clear) => {
            let mut store = open_store(global)?;
            store.clear(&clear.entity)?;
            println!("Cleared log for {}", clear.entity);
            Ok(())
        }
        LogCommand::ClearAll => {
            let mut store = open_store(global)?;
            let removed = store.clear_all()?;
            println!("Cleared {} log(s)", removed);
            Ok(())
        }
        LogCommand::Stats => {
            let store = open_store(global)?;
            println!("{}", serde_json::to_string_pretty(&statistics(&store)?)?);
            Ok(())
        }
        LogCommand::Export(export_args) => execute_export(global, export_args),
    }
}

fn open_store(
    global: &GlobalArgs,
) -> Result<AuditLogStore<hrlog_store::SqliteStorage>, Box<dyn std::error::Error>> {
    Ok(AuditLogStore::with_config(
        global.open_storage()?,
        global.load_config()?,
    ))
}

fn execute_show(global: &GlobalArgs, args: ShowArgs) -> CliResult {
    let service = global.open_service(SystemClock)?;
    let record = args
        .created_at
        .map(|ts| RecordSnapshot::single(CREATED_AT_FIELD, FieldValue::text(ts)));
    let entries = service.load_log(&args.entity, record.as_ref());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", render_human_summary(&args.entity, &entries));
    }
    Ok(())
}

fn execute_export(global: &GlobalArgs, args: ExportArgs) -> CliResult {
    let store = open_store(global)?;
    let dump = export(&store, args.entity.as_deref(), SystemClock.now())?;
    let text = serde_json::to_string_pretty(&dump)?;

    match args.out {
        Some(path) => {
            std::fs::write(&path, text)?;
            println!(
                "Exported {} entries to {} (sha256 {})",
                dump.total_logs,
                path.display(),
                dump.digest
            );
        }
        None => println!("{}", text),
    }
    Ok(())
}
