//! Describe the differences between two snapshots

use super::{read_snapshot, CliResult, GlobalArgs};
use clap::Args;
use hrlog_core::diff::{compute_diff_with, describe};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Snapshot before the edit
    pub original: PathBuf,

    /// Snapshot after the edit
    pub edited: PathBuf,

    /// Print the raw changes as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(global: &GlobalArgs, args: DiffArgs) -> CliResult {
    let config = global.load_config()?;
    let original = read_snapshot(&args.original)?;
    let edited = read_snapshot(&args.edited)?;
    let changes = compute_diff_with(&original, &edited, &config.denylist);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
        return Ok(());
    }

    if changes.is_empty() {
        println!("No changes");
    }
    for change in &changes {
        println!("{}", describe(change));
    }
    Ok(())
}
