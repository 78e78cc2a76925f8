//! Subcommands and the options they share

pub mod commit;
pub mod diff;
pub mod log;
pub mod replay;

use clap::Args;
use hrlog_core::logging_facility::{init, Profile};
use hrlog_core::model::RecordSnapshot;
use hrlog_core::{AuditLogConfig, AuditLogService, Clock};
use hrlog_store::SqliteStorage;
use std::path::{Path, PathBuf};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Options accepted by every subcommand
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// SQLite database holding the logs
    #[arg(long, global = true, default_value = ".hrlog/audit.db")]
    pub db: PathBuf,

    /// Byte quota of the database; unlimited when omitted
    #[arg(long, global = true)]
    pub quota_bytes: Option<usize>,

    /// TOML file overriding the audit log configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl GlobalArgs {
    pub fn init_logging(&self) {
        init(if self.log_json {
            Profile::Production
        } else {
            Profile::Development
        });
    }

    pub fn load_config(&self) -> Result<AuditLogConfig, Box<dyn std::error::Error>> {
        match &self.config {
            Some(path) => Ok(AuditLogConfig::load(path)?),
            None => Ok(AuditLogConfig::default()),
        }
    }

    pub fn open_storage(&self) -> Result<SqliteStorage, Box<dyn std::error::Error>> {
        Ok(SqliteStorage::open(&self.db, self.quota_bytes)?)
    }

    pub fn open_service<C: Clock>(
        &self,
        clock: C,
    ) -> Result<AuditLogService<SqliteStorage, C>, Box<dyn std::error::Error>> {
        Ok(AuditLogService::with_config(
            self.open_storage()?,
            clock,
            self.load_config()?,
        ))
    }
}

/// Read a JSON record snapshot from disk
pub fn read_snapshot(path: &Path) -> Result<RecordSnapshot, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| format!("{} is not valid JSON: {}", path.display(), e))?;
    if !value.is_object() {
        return Err(format!("{} must contain a JSON object", path.display()).into());
    }
    Ok(RecordSnapshot::from_json(value))
}
