//! Content model definitions.
//!
//! A [`ContentModel`] is the static description of one content type: its
//! columns, its relations, the capabilities it carries and its search
//! configuration. Models are declared once (usually in TOML) and collected
//! into a [`ModelRegistry`](crate::registry::ModelRegistry).
//!
//! # Declaring a model
//!
//! ```toml
//! [[model]]
//! name = "Article"
//! parent = "Page"
//! fields = { Title = "Varchar(255)", Published = "Date" }
//! has_one = { Author = "Person" }
//! indexed_fields = [
//!     "Title",
//!     { name = "Summary", type = "text", analyzer = "en_stem" },
//!     { name = "Author", related = { Born = { type = "date" } } },
//! ]
//! dependent_classes = ["ArticleIndex"]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::instance::Instance;
use crate::kind::{FieldKind, IndexingHints, TypeDescriptor};
use crate::value::Value;

/// Typed getter registered for a model under a field name.
///
/// Stands in for `get<FieldName>` style accessor methods.
pub type Accessor = Arc<dyn Fn(&Instance) -> Value + Send + Sync>;

/// Capability tags a model carries.
///
/// Capabilities are inherited: a model carries a capability if it or any of
/// its ancestors declares it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Participates in search synchronization.
    pub indexable: bool,
    /// Has staged and live versions.
    pub versioned: bool,
    /// Page-like: versioned publishing plus a `ShowInSearch` flag.
    pub page_like: bool,
    /// File-like: a `Filename` column pointing at bytes on disk.
    pub file: bool,
}

impl Capabilities {
    /// Union of two capability sets.
    pub fn union(self, other: Capabilities) -> Capabilities {
        Capabilities {
            indexable: self.indexable || other.indexable,
            versioned: self.versioned || other.versioned,
            page_like: self.page_like || other.page_like,
            file: self.file || other.file,
        }
    }
}

/// Relation cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// One-to-many.
    HasMany,
    /// Many-to-one or one-to-one.
    HasOne,
    /// Many-to-many.
    ManyMany,
}

impl RelationKind {
    /// Whether the relation resolves to a list of instances.
    pub fn is_multi(&self) -> bool {
        !matches!(self, RelationKind::HasOne)
    }
}

/// A named relation resolved against a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Cardinality.
    pub kind: RelationKind,
    /// Related model's type name.
    pub target: String,
}

/// Per-field search configuration carrying inline overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Field, accessor or relation name.
    pub name: String,

    /// Explicit search type; always wins over derivation.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldKind>,

    /// Analyzer hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,

    /// Type overrides for fields of a related model, keyed by related field name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub related: BTreeMap<String, TypeDescriptor>,

    /// Other indexing hints, kept alongside an explicit type.
    #[serde(flatten)]
    pub hints: IndexingHints,
}

/// One entry of a model's `indexed_fields` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexedField {
    /// Positional entry: a bare field or relation name.
    Name(String),
    /// Keyed entry carrying inline overrides.
    Configured(FieldConfig),
}

impl IndexedField {
    /// The referenced field, accessor or relation name.
    pub fn name(&self) -> &str {
        match self {
            IndexedField::Name(name) => name,
            IndexedField::Configured(config) => &config.name,
        }
    }

    /// Explicit type descriptor, when the entry carries one.
    pub fn explicit_type(&self) -> Option<TypeDescriptor> {
        match self {
            IndexedField::Configured(FieldConfig {
                kind: Some(kind),
                analyzer,
                hints,
                ..
            }) => Some(TypeDescriptor {
                kind: *kind,
                analyzer: analyzer.clone(),
                hints: hints.clone(),
            }),
            _ => None,
        }
    }

    /// Override for a related model's field, keyed by that field's name.
    pub fn related_override(&self, field: &str) -> Option<&TypeDescriptor> {
        match self {
            IndexedField::Configured(config) => config.related.get(field),
            IndexedField::Name(_) => None,
        }
    }
}

impl From<&str> for IndexedField {
    fn from(name: &str) -> Self {
        IndexedField::Name(name.to_string())
    }
}

impl From<FieldConfig> for IndexedField {
    fn from(config: FieldConfig) -> Self {
        IndexedField::Configured(config)
    }
}

/// Static description of a content type.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ContentModel {
    /// Type name.
    pub name: String,

    /// Parent type, whose fields, relations and capabilities are inherited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Declared columns: field name → primitive data type (e.g. `Varchar(255)`).
    #[serde(default)]
    pub fields: BTreeMap<String, String>,

    /// One-to-many relations: name → related type.
    #[serde(default)]
    pub has_many: BTreeMap<String, String>,

    /// Many-to-one / one-to-one relations: name → related type.
    #[serde(default)]
    pub has_one: BTreeMap<String, String>,

    /// Many-to-many relations: name → related type.
    #[serde(default)]
    pub many_many: BTreeMap<String, String>,

    /// Declared capabilities.
    #[serde(default)]
    pub capabilities: Capabilities,

    /// Fields, accessors and relations to index.
    #[serde(default)]
    pub indexed_fields: Vec<IndexedField>,

    /// Types to re-index whenever this type changes.
    #[serde(default)]
    pub dependent_classes: Vec<String>,

    #[serde(skip)]
    pub(crate) accessors: BTreeMap<String, Accessor>,
}

impl ContentModel {
    /// Create an empty model with the given type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the parent type.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Declare a column.
    pub fn with_field(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.fields.insert(name.into(), data_type.into());
        self
    }

    /// Declare a relation.
    pub fn with_relation(
        mut self,
        kind: RelationKind,
        name: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        let map = match kind {
            RelationKind::HasMany => &mut self.has_many,
            RelationKind::HasOne => &mut self.has_one,
            RelationKind::ManyMany => &mut self.many_many,
        };
        map.insert(name.into(), target.into());
        self
    }

    /// Set capabilities.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Append an `indexed_fields` entry.
    pub fn index(mut self, field: impl Into<IndexedField>) -> Self {
        self.indexed_fields.push(field.into());
        self
    }

    /// Append a dependent class.
    pub fn with_dependent(mut self, type_name: impl Into<String>) -> Self {
        self.dependent_classes.push(type_name.into());
        self
    }

    /// Register a typed getter under `name`.
    pub fn with_accessor<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&Instance) -> Value + Send + Sync + 'static,
    {
        self.accessors.insert(name.into(), Arc::new(accessor));
        self
    }

    /// Names of the accessors declared directly on this model.
    pub fn accessor_names(&self) -> impl Iterator<Item = &str> {
        self.accessors.keys().map(String::as_str)
    }
}

impl fmt::Debug for ContentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentModel")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("fields", &self.fields)
            .field("has_many", &self.has_many)
            .field("has_one", &self.has_one)
            .field("many_many", &self.many_many)
            .field("capabilities", &self.capabilities)
            .field("indexed_fields", &self.indexed_fields)
            .field("dependent_classes", &self.dependent_classes)
            .field("accessors", &self.accessors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_field_untagged_forms() {
        let fields: Vec<IndexedField> = serde_json::from_str(
            r#"["Title", {"name": "Body", "type": "text", "analyzer": "en_stem"},
                {"name": "Author", "related": {"Born": {"type": "date"}}}]"#,
        )
        .unwrap();

        assert_eq!(fields[0], IndexedField::from("Title"));
        assert_eq!(fields[0].explicit_type(), None);

        let body = fields[1].explicit_type().unwrap();
        assert_eq!(body.kind, FieldKind::Text);
        assert_eq!(body.analyzer.as_deref(), Some("en_stem"));

        assert_eq!(fields[2].name(), "Author");
        assert_eq!(fields[2].explicit_type(), None);
        assert_eq!(
            fields[2].related_override("Born").map(|d| d.kind),
            Some(FieldKind::Date)
        );
        assert!(fields[2].related_override("Name").is_none());
    }

    #[test]
    fn test_model_from_toml() {
        let model: ContentModel = toml::from_str(
            r#"
            name = "Article"
            parent = "Page"
            fields = { Title = "Varchar(255)" }
            has_one = { Author = "Person" }
            indexed_fields = ["Title", "Author"]
            dependent_classes = ["ArticleIndex"]
            capabilities = { indexable = true }
            "#,
        )
        .unwrap();

        assert_eq!(model.name, "Article");
        assert_eq!(model.parent.as_deref(), Some("Page"));
        assert_eq!(model.fields["Title"], "Varchar(255)");
        assert_eq!(model.has_one["Author"], "Person");
        assert_eq!(model.indexed_fields.len(), 2);
        assert!(model.capabilities.indexable);
        assert!(!model.capabilities.page_like);
    }

    #[test]
    fn test_explicit_type_keeps_extra_hints() {
        let model: ContentModel = toml::from_str(
            r#"
            name = "Product"
            indexed_fields = [
                { name = "Code", type = "text", index = "not_analyzed", boost = 2 },
            ]
            "#,
        )
        .unwrap();

        let descriptor = model.indexed_fields[0].explicit_type().unwrap();
        assert_eq!(descriptor.kind, FieldKind::Text);
        assert_eq!(descriptor.hints.len(), 2);
        assert_eq!(descriptor.hints["index"], "not_analyzed");
        assert_eq!(descriptor.hints["boost"], 2);
    }

    #[test]
    fn test_capabilities_union() {
        let a = Capabilities {
            versioned: true,
            ..Default::default()
        };
        let b = Capabilities {
            indexable: true,
            ..Default::default()
        };
        let both = a.union(b);
        assert!(both.versioned && both.indexable);
        assert!(!both.page_like && !both.file);
    }

    #[test]
    fn test_relation_kind_multi() {
        assert!(RelationKind::HasMany.is_multi());
        assert!(RelationKind::ManyMany.is_multi());
        assert!(!RelationKind::HasOne.is_multi());
    }

    #[test]
    fn test_debug_lists_accessor_names() {
        let model = ContentModel::new("Page").with_accessor("ShowInSearch", |_| Value::Bool(true));
        let debug = format!("{model:?}");
        assert!(debug.contains("ShowInSearch"));
    }
}
