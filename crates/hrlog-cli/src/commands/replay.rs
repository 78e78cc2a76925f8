//! Replay timed field edits through the debounce path
//!
//! A script is a JSON document:
//!
//! ```json
//! {
//!   "steps": [
//!     {"at_ms": 0, "field": "age", "value": 31},
//!     {"at_ms": 300, "field": "age", "value": 32}
//!   ],
//!   "end": "commit"
//! }
//! ```
//!
//! Steps run on a manual clock at their offset from the start of the
//! session. Pending edits are allowed to settle before the session ends
//! with `commit` (the default) or `cancel`.

use super::{read_snapshot, CliResult, GlobalArgs};
use clap::Args;
use hrlog_core::model::{ChangeEntry, FieldValue};
use hrlog_core::{Clock, ManualClock, SystemClock};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ReplayArgs {
    #[arg(long)]
    pub entity: String,

    /// Snapshot the session starts from
    #[arg(long)]
    pub snapshot: PathBuf,

    /// JSON script of timed edits
    #[arg(long)]
    pub script: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptEnd {
    #[default]
    Commit,
    Cancel,
}

#[derive(Debug, Deserialize)]
pub struct ScriptStep {
    pub at_ms: i64,
    pub field: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct Script {
    pub steps: Vec<ScriptStep>,
    #[serde(default)]
    pub end: ScriptEnd,
}

fn read_script(path: &Path) -> Result<Script, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let mut script: Script = serde_json::from_str(&text)
        .map_err(|e| format!("invalid replay script {}: {}", path.display(), e))?;
    if let Some(step) = script.steps.iter().find(|s| s.at_ms < 0) {
        return Err(format!("step for {} has negative at_ms {}", step.field, step.at_ms).into());
    }
    script.steps.sort_by_key(|s| s.at_ms);
    Ok(script)
}

/// Clock reading for a step, or an error when the offset overflows
fn step_time(start: i64, step: &ScriptStep) -> Result<i64, String> {
    start.checked_add(step.at_ms).ok_or_else(|| {
        format!(
            "step for {} has at_ms {} beyond the clock range",
            step.field, step.at_ms
        )
    })
}

pub fn execute(global: &GlobalArgs, args: ReplayArgs) -> CliResult {
    let original = read_snapshot(&args.snapshot)?;
    let script = read_script(&args.script)?;

    let start = SystemClock.now_millis();
    let clock = ManualClock::new(start);
    let mut service = global.open_service(clock.clone())?;

    service.enter_edit_session(&args.entity, original.clone());
    let mut current = original.clone();
    let mut recorded: Vec<ChangeEntry> = Vec::new();

    for step in script.steps {
        clock.set(step_time(start, &step)?);
        recorded.extend(service.tick());

        let old = current.get(&step.field).cloned().unwrap_or_else(FieldValue::null);
        let new = FieldValue::from(step.value);
        service.record_field_change(&step.field, old, new.clone());
        current = current.with_field(step.field, new);
    }

    // let every pending edit settle
    while let Some(due) = service.next_due() {
        clock.set(due);
        recorded.extend(service.tick());
    }

    match script.end {
        ScriptEnd::Commit => {
            recorded.extend(service.commit_edits(&original, &current));
            println!("Session saved");
        }
        ScriptEnd::Cancel => {
            service.cancel_edit();
            println!("Session cancelled");
        }
    }

    println!("Recorded {} change(s) for {}", recorded.len(), args.entity);
    for entry in &recorded {
        println!("  {}", entry.description);
    }
    Ok(())
}
