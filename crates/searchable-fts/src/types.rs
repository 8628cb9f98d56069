//! Common types for the FTS module.
//!
//! These types are shared by the schema builder, the document synthesizer and
//! every search engine, and are always available regardless of feature flags.

use serde::{Deserialize, Serialize};
use serde_json::json;

use searchable_core::{FieldKind, IndexingHints, TypeDescriptor};

/// Default name of the reserved published-flag field.
pub const PUBLISHED_FIELD: &str = "SS_Published";

/// Search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Engine type: "tantivy" or "memory".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Root directory for on-disk indexes (one sub-directory per type).
    #[serde(default)]
    pub index_path: Option<String>,

    /// Name of the reserved published-flag field.
    #[serde(default = "default_published_field")]
    pub published_field: String,

    /// Separator between relation and related field in flattened names.
    #[serde(default = "default_relation_separator")]
    pub relation_separator: String,

    /// Wall-clock limit for a full reindex, in seconds.
    #[serde(default = "default_time_limit_secs")]
    pub time_limit_secs: u64,
}

fn default_backend() -> String {
    "tantivy".to_string()
}

fn default_published_field() -> String {
    PUBLISHED_FIELD.to_string()
}

fn default_relation_separator() -> String {
    "_".to_string()
}

fn default_time_limit_secs() -> u64 {
    3600
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            index_path: None,
            published_field: default_published_field(),
            relation_separator: default_relation_separator(),
            time_limit_secs: default_time_limit_secs(),
        }
    }
}

impl SearchConfig {
    /// Relation naming scheme for this configuration.
    pub fn naming(&self) -> RelationNaming {
        RelationNaming::new(&self.relation_separator)
    }
}

/// A named search field with its type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name in the search document.
    pub name: String,

    /// Search type.
    #[serde(rename = "type")]
    pub kind: FieldKind,

    /// Analyzer hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,

    /// Extra indexing hints from an explicit descriptor.
    #[serde(flatten)]
    pub hints: IndexingHints,
}

impl FieldSpec {
    /// Field spec with no analyzer hint.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            analyzer: None,
            hints: IndexingHints::new(),
        }
    }

    /// Field spec from an explicit descriptor.
    pub fn from_descriptor(name: impl Into<String>, descriptor: &TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            kind: descriptor.kind,
            analyzer: descriptor.analyzer.clone(),
            hints: descriptor.hints.clone(),
        }
    }
}

/// Ordered set of field specs describing one type's search mapping.
///
/// Inserting a name that is already present replaces its descriptor and keeps
/// its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    /// Type the mapping belongs to.
    pub type_name: String,

    /// Fields in declaration order.
    pub fields: Vec<FieldSpec>,
}

impl IndexSchema {
    /// Empty schema for a type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Add or replace a field.
    pub fn insert(&mut self, spec: FieldSpec) {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
    }

    /// Field spec by name.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether a field is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Declared field names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Engine mapping definition: `{"properties": {name: {"type": ...}}}`.
    ///
    /// Extra hints are emitted next to `type` and `analyzer`.
    pub fn to_mapping(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|f| {
                let mut spec: serde_json::Map<String, serde_json::Value> = f
                    .hints
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                spec.insert("type".into(), json!(f.kind.as_str()));
                if let Some(analyzer) = &f.analyzer {
                    spec.insert("analyzer".into(), json!(analyzer));
                }
                (f.name.clone(), serde_json::Value::Object(spec))
            })
            .collect();
        json!({ "properties": properties })
    }
}

/// Naming scheme for flattened relation fields (`relation<sep>field`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationNaming {
    separator: String,
}

impl RelationNaming {
    /// Scheme joining with `separator`.
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Flattened name for `relation` and `field`.
    pub fn join(&self, relation: &str, field: &str) -> String {
        format!("{relation}{}{field}", self.separator)
    }

    /// Split a flattened name against the declared relation names.
    ///
    /// The longest relation name that prefixes `name` (followed by the
    /// separator and a non-empty remainder) wins, so relation and field names
    /// may themselves contain the separator.
    pub fn split<'a, 'r>(
        &self,
        name: &'a str,
        relations: impl IntoIterator<Item = &'r str>,
    ) -> Option<(&'a str, &'a str)> {
        relations
            .into_iter()
            .filter_map(|relation| {
                let rest = name.strip_prefix(relation)?;
                let field = rest.strip_prefix(self.separator.as_str())?;
                (!field.is_empty()).then(|| (&name[..relation.len()], field))
            })
            .max_by_key(|(relation, _)| relation.len())
    }
}

impl Default for RelationNaming {
    fn default() -> Self {
        Self::new("_")
    }
}

// ============================================================================
// Tests
// ============================================================================
