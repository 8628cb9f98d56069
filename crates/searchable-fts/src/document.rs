//! Search document representation.
//!
//! A [`SearchDocument`] is the denormalized record pushed to a search engine
//! for one content instance: its id, its type and a map of field values.
//! Documents are transient; they are synthesized at write time and never
//! stored outside the engine.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use searchable_core::{InstanceId, Value};

/// A value stored in a search document field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Normalized `YYYY-MM-DDTHH:MM:SS` timestamp.
    Date(String),
    /// Multi-valued field collected from a list relation.
    List(Vec<FieldValue>),
    /// Attachment referenced by path, read by the engine.
    File(PathBuf),
    /// Attachment embedded as base64 text.
    Encoded(String),
}

impl FieldValue {
    /// Convert a raw content value. Nulls produce no value.
    pub fn from_value(value: Value) -> Option<FieldValue> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(FieldValue::Bool(b)),
            Value::Int(i) => Some(FieldValue::Int(i)),
            Value::Float(f) => Some(FieldValue::Float(f)),
            Value::Text(s) => Some(FieldValue::Text(s)),
            Value::File(f) => Some(FieldValue::File(f.file)),
        }
    }

    /// Textual rendering used by engines that store everything as text.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Text(s) | FieldValue::Date(s) | FieldValue::Encoded(s) => s.clone(),
            FieldValue::File(path) => path.display().to_string(),
            FieldValue::List(items) => items
                .iter()
                .map(FieldValue::to_text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// A document to be indexed, keyed by the instance id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchDocument {
    /// Instance identifier.
    pub id: InstanceId,

    /// Type the document belongs to.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Field values.
    pub fields: BTreeMap<String, FieldValue>,
}

impl SearchDocument {
    /// Empty document for an instance.
    pub fn new(type_name: impl Into<String>, id: InstanceId) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set a field value.
    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    /// Field value by name.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Whether a field is set.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Field names, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields set.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
