//! hrlog CLI
//!
//! Command-line interface for the HR change audit log

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "hrlog")]
#[command(about = "hrlog - Change audit log for HR records", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: commands::GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect and maintain stored logs
    Log(commands::log::LogArgs),
    /// Describe the changes between two record snapshots (no writes)
    Diff(commands::diff::DiffArgs),
    /// Record the changes between two snapshots as one saved edit session
    Commit(commands::commit::CommitArgs),
    /// Replay a timed script of field edits through the debounce path
    Replay(commands::replay::ReplayArgs),
}

fn main() {
    let cli = Cli::parse();
    cli.global.init_logging();

    let result = match cli.command {
        Commands::Log(args) => commands::log::execute(&cli.global, args),
        Commands::Diff(args) => commands::diff::execute(&cli.global, args),
        Commands::Commit(args) => commands::commit::execute(&cli.global, args),
        Commands::Replay(args) => commands::replay::execute(&cli.global, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
