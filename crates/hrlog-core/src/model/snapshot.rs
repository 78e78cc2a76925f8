use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A primitive field value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
}

/// The three shapes a field value can take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    List,
    Record,
}

/// A loosely-typed field value
///
/// Converts losslessly from and to `serde_json::Value`: objects become
/// `Record`, arrays become `List`, everything else is a `Scalar`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FieldValue {
    Scalar(Scalar),
    List(Vec<FieldValue>),
    Record(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// The null scalar
    pub fn null() -> Self {
        FieldValue::Scalar(Scalar::Null)
    }

    /// A text scalar
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Scalar(Scalar::Text(s.into()))
    }

    pub fn shape(&self) -> Shape {
        match self {
            FieldValue::Scalar(_) => Shape::Scalar,
            FieldValue::List(_) => Shape::List,
            FieldValue::Record(_) => Shape::Record,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Scalar(Scalar::Null))
    }

    /// Convert back into a JSON value
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Scalar(Scalar::Null) => Value::Null,
            FieldValue::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            FieldValue::Scalar(Scalar::Number(n)) => Value::Number(n.clone()),
            FieldValue::Scalar(Scalar::Text(s)) => Value::String(s.clone()),
            FieldValue::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            FieldValue::Record(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }

    /// Canonical serialization used for structural equality
    ///
    /// Record keys serialize in sorted order, so two values are
    /// structurally equal exactly when their canonical forms are equal.
    pub fn canonical(&self) -> String {
        self.to_json().to_string()
    }

    /// Number of elements for lists, number of keys for records, 0 otherwise
    pub fn len(&self) -> usize {
        match self {
            FieldValue::Scalar(_) => 0,
            FieldValue::List(items) => items.len(),
            FieldValue::Record(fields) => fields.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text of a scalar for display; `None` for null and non-scalars
    pub fn as_display_text(&self) -> Option<String> {
        match self {
            FieldValue::Scalar(Scalar::Null) => None,
            FieldValue::Scalar(Scalar::Bool(b)) => Some(b.to_string()),
            FieldValue::Scalar(Scalar::Number(n)) => Some(n.to_string()),
            FieldValue::Scalar(Scalar::Text(s)) => Some(s.clone()),
            FieldValue::List(_) | FieldValue::Record(_) => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Scalar(Scalar::Null),
            Value::Bool(b) => FieldValue::Scalar(Scalar::Bool(b)),
            Value::Number(n) => FieldValue::Scalar(Scalar::Number(n)),
            Value::String(s) => FieldValue::Scalar(Scalar::Text(s)),
            Value::Array(items) => FieldValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(fields) => {
                FieldValue::Record(fields.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        value.to_json()
    }
}

/// Immutable point-in-time view of an entity's fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct RecordSnapshot {
    fields: BTreeMap<String, FieldValue>,
}

impl RecordSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from a JSON object; any other JSON yields an empty snapshot
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self {
                fields: fields.into_iter().map(|(k, v)| (k, v.into())).collect(),
            },
            _ => Self::default(),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Snapshot holding exactly one field
    pub fn single(field: impl Into<String>, value: FieldValue) -> Self {
        Self::new().with_field(field, value)
    }

    /// Builder-style field insert
    pub fn with_field(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Field names in sorted order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Value> for RecordSnapshot {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

impl From<RecordSnapshot> for Value {
    fn from(snapshot: RecordSnapshot) -> Self {
        snapshot.to_json()
    }
}
