//! Record a saved edit session

use super::{read_snapshot, CliResult, GlobalArgs};
use clap::Args;
use hrlog_core::SystemClock;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CommitArgs {
    #[arg(long)]
    pub entity: String,

    /// Snapshot the session started from
    pub original: PathBuf,

    /// Snapshot being saved
    pub edited: PathBuf,
}

pub fn execute(global: &GlobalArgs, args: CommitArgs) -> CliResult {
    let original = read_snapshot(&args.original)?;
    let edited = read_snapshot(&args.edited)?;

    let mut service = global.open_service(SystemClock)?;
    service.enter_edit_session(&args.entity, original.clone());
    let entries = service.commit_edits(&original, &edited);

    println!("Recorded {} change(s) for {}", entries.len(), args.entity);
    for entry in &entries {
        println!("  {}", entry.description);
    }
    Ok(())
}
