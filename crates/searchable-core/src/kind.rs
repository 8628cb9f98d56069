//! Search field kinds.
//!
//! [`FieldKind`] is the closed set of search-engine field types a content
//! field can be mapped to. Configuration names them by their lowercase
//! engine name (`"text"`, `"date"`, ...).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Search-engine field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// True/false flag.
    Boolean,
    /// 64-bit signed integer.
    Integer,
    /// Single precision number.
    Float,
    /// Double precision number.
    Double,
    /// Timestamp rendered as `YYYY-MM-DDTHH:MM:SS`.
    Date,
    /// Analyzed free text.
    Text,
    /// Binary file content.
    Attachment,
}

impl FieldKind {
    /// All kinds, in declaration order.
    pub const ALL: [FieldKind; 7] = [
        FieldKind::Boolean,
        FieldKind::Integer,
        FieldKind::Float,
        FieldKind::Double,
        FieldKind::Date,
        FieldKind::Text,
        FieldKind::Attachment,
    ];

    /// Engine name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Boolean => "boolean",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Double => "double",
            FieldKind::Date => "date",
            FieldKind::Text => "text",
            FieldKind::Attachment => "attachment",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::config(format!("unknown field type '{s}'")))
    }
}

/// Extra indexing hints (`index`, `boost`, ...) passed through to the engine
/// mapping untouched.
pub type IndexingHints = BTreeMap<String, serde_json::Value>;

/// Explicit search-type descriptor supplied in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Field type.
    #[serde(rename = "type")]
    pub kind: FieldKind,

    /// Analyzer hint passed through to the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,

    /// Any other keys of the descriptor.
    #[serde(flatten)]
    pub hints: IndexingHints,
}

impl TypeDescriptor {
    /// Descriptor with no analyzer hint.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            analyzer: None,
            hints: IndexingHints::new(),
        }
    }
}

impl From<FieldKind> for TypeDescriptor {
    fn from(kind: FieldKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str_round_trips_all() {
        for kind in FieldKind::ALL {
            assert_eq!(kind.as_str().parse::<FieldKind>().unwrap(), kind);
        }
        assert!("keyword".parse::<FieldKind>().is_err());
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&FieldKind::Attachment).unwrap();
        assert_eq!(json, "\"attachment\"");
    }

    #[test]
    fn test_descriptor_deserialization() {
        let desc: TypeDescriptor =
            serde_json::from_str(r#"{"type": "text", "analyzer": "en_stem"}"#).unwrap();
        assert_eq!(desc.kind, FieldKind::Text);
        assert_eq!(desc.analyzer.as_deref(), Some("en_stem"));

        let json = serde_json::to_string(&TypeDescriptor::new(FieldKind::Date)).unwrap();
        assert_eq!(json, r#"{"type":"date"}"#);
    }

    #[test]
    fn test_descriptor_keeps_extra_hints() {
        let desc: TypeDescriptor =
            serde_json::from_str(r#"{"type": "text", "index": "not_analyzed", "boost": 2}"#)
                .unwrap();
        assert_eq!(desc.kind, FieldKind::Text);
        assert_eq!(desc.hints["index"], "not_analyzed");
        assert_eq!(desc.hints["boost"], 2);

        let json: serde_json::Value = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["index"], "not_analyzed");
        assert_eq!(json["type"], "text");
    }
}
