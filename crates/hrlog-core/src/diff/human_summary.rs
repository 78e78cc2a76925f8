//! Human-readable summary renderer for an entity's change log.

use crate::diff::describe::format_field_name;
use crate::model::{ChangeEntry, ChangeKind};

/// Render a Markdown/text summary of change entries, in the order given.
///
/// Intended for terminal output and review displays; it is informational
/// only and never parsed back.
pub fn render_human_summary(entity_id: &str, entries: &[ChangeEntry]) -> String {
    let mut out = String::new();

    out.push_str(&format!("## Change Log: {}\n\n", entity_id));

    if entries.is_empty() {
        out.push_str("_No changes recorded._\n");
        return out;
    }

    out.push_str(&format!("**Entries**: {}\n\n", entries.len()));
    out.push_str("| When | Kind | Field | Change | By |\n|---|---|---|---|---|\n");
    for entry in entries {
        let field = match entry.kind {
            ChangeKind::Created | ChangeKind::ModeEntered => "-".to_string(),
            _ => format_field_name(&entry.field),
        };
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            kind_label(entry.kind),
            field,
            escape_cell(&entry.description),
            escape_cell(&entry.actor),
        ));
    }

    out
}

fn kind_label(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::FieldUpdated => "Field",
        ChangeKind::ArrayUpdated => "List",
        ChangeKind::ObjectUpdated => "Record",
        ChangeKind::Created => "Created",
        ChangeKind::ModeEntered => "Edit",
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
