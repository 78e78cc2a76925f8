use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// What kind of change an entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    /// A scalar field changed
    FieldUpdated,
    /// A list field changed
    ArrayUpdated,
    /// A nested record field changed
    ObjectUpdated,
    /// The record was created
    Created,
    /// An edit session was opened
    ModeEntered,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::FieldUpdated => "FIELD_UPDATED",
            ChangeKind::ArrayUpdated => "ARRAY_UPDATED",
            ChangeKind::ObjectUpdated => "OBJECT_UPDATED",
            ChangeKind::Created => "CREATED",
            ChangeKind::ModeEntered => "MODE_ENTERED",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "FIELD_UPDATED" => Ok(ChangeKind::FieldUpdated),
            "ARRAY_UPDATED" => Ok(ChangeKind::ArrayUpdated),
            "OBJECT_UPDATED" => Ok(ChangeKind::ObjectUpdated),
            "CREATED" => Ok(ChangeKind::Created),
            "MODE_ENTERED" => Ok(ChangeKind::ModeEntered),
            other => Err(format!("unknown change kind: {}", other)),
        }
    }
}

/// A single difference produced by the diff engine, before description
///
/// For `FieldUpdated` the values are the raw old/new values; for list and
/// record changes they are the rendered summaries (e.g. `"2 child(ren)"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub kind: ChangeKind,
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// One recorded, described, timestamped change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    pub id: String,
    pub entity_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: ChangeKind,
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    pub actor: String,
    pub description: String,
}

impl ChangeEntry {
    /// Stamp a described change with a fresh id, the entity and the actor
    pub fn stamp(
        change: FieldChange,
        entity_id: impl Into<String>,
        actor: impl Into<String>,
        description: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            entity_id: entity_id.into(),
            timestamp,
            kind: change.kind,
            field: change.field,
            old_value: change.old_value,
            new_value: change.new_value,
            actor: actor.into(),
            description: description.into(),
        }
    }
}
