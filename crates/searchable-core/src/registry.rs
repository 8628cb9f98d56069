//! Model registry.
//!
//! [`ModelRegistry`] holds every [`ContentModel`] of a process and answers the
//! introspection questions the search layer asks: inherited columns, merged
//! relations, inherited capabilities and registered accessors. It is built
//! once at startup and is read-only afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::model::{Accessor, Capabilities, ContentModel, IndexedField, Relation, RelationKind};
use crate::value::Value;

/// Columns every content type carries.
pub const FIXED_FIELDS: [(&str, &str); 4] = [
    ("ID", "Int"),
    ("ClassName", "Enum"),
    ("Created", "SS_Datetime"),
    ("LastEdited", "SS_Datetime"),
];

#[derive(Deserialize)]
struct ModelFile {
    #[serde(default)]
    model: Vec<ContentModel>,
}

/// Registry of content models, keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, ContentModel>,
}

impl ModelRegistry {
    /// Build a registry, validating the parent chains.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for duplicate type names, unknown
    /// parents, or a cycle in a parent chain.
    pub fn new(models: impl IntoIterator<Item = ContentModel>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for model in models {
            if map.contains_key(&model.name) {
                return Err(Error::config(format!("duplicate model '{}'", model.name)));
            }
            map.insert(model.name.clone(), model);
        }

        let registry = Self { models: map };
        registry.validate()?;
        log::debug!(
            "Registered {} content models ({} indexable)",
            registry.models.len(),
            registry.indexable().count()
        );
        Ok(registry)
    }

    /// Parse `[[model]]` tables from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ModelFile = toml::from_str(content)
            .map_err(|e| Error::config(format!("invalid model definitions: {e}")))?;
        Self::new(file.model)
    }

    /// Load `[[model]]` tables from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        for model in self.models.values() {
            let mut current = model;
            let mut depth = 0;
            while let Some(parent) = &current.parent {
                current = self.models.get(parent).ok_or_else(|| {
                    Error::config(format!(
                        "model '{}' names unknown parent '{parent}'",
                        current.name
                    ))
                })?;
                depth += 1;
                if depth > self.models.len() {
                    return Err(Error::config(format!(
                        "cycle in parent chain of '{}'",
                        model.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Register a typed getter on a model.
    ///
    /// Accessors are inherited by subtypes and shadow columns of the same name.
    pub fn register_accessor<F>(&mut self, type_name: &str, name: &str, accessor: F) -> Result<()>
    where
        F: Fn(&Instance) -> Value + Send + Sync + 'static,
    {
        let model = self
            .models
            .get_mut(type_name)
            .ok_or_else(|| Error::not_found("model", type_name))?;
        model
            .accessors
            .insert(name.to_string(), std::sync::Arc::new(accessor));
        Ok(())
    }

    /// Look up a model.
    pub fn get(&self, type_name: &str) -> Option<&ContentModel> {
        self.models.get(type_name)
    }

    /// Look up a model, failing when it is unknown.
    pub fn model(&self, type_name: &str) -> Result<&ContentModel> {
        self.get(type_name)
            .ok_or_else(|| Error::not_found("model", type_name))
    }

    /// All models, ordered by type name.
    pub fn models(&self) -> impl Iterator<Item = &ContentModel> {
        self.models.values()
    }

    /// Models carrying the indexable capability, ordered by type name.
    pub fn indexable(&self) -> impl Iterator<Item = &ContentModel> {
        self.models
            .values()
            .filter(|m| self.capabilities(&m.name).indexable)
    }

    /// The model and its ancestors, nearest first.
    pub fn ancestry(&self, type_name: &str) -> Vec<&ContentModel> {
        let mut chain = Vec::new();
        let mut next = self.get(type_name);
        while let Some(model) = next {
            chain.push(model);
            next = model.parent.as_deref().and_then(|p| self.get(p));
        }
        chain
    }

    /// Top-most ancestor of a type (the type itself when it has no parent).
    pub fn root<'a>(&'a self, type_name: &'a str) -> &'a str {
        self.ancestry(type_name)
            .last()
            .map(|m| m.name.as_str())
            .unwrap_or(type_name)
    }

    /// Whether `type_name` is `ancestor` or inherits from it.
    pub fn is_a(&self, type_name: &str, ancestor: &str) -> bool {
        self.ancestry(type_name).iter().any(|m| m.name == ancestor)
    }

    /// Inherited capabilities of a type.
    pub fn capabilities(&self, type_name: &str) -> Capabilities {
        self.ancestry(type_name)
            .iter()
            .fold(Capabilities::default(), |acc, m| acc.union(m.capabilities))
    }

    /// `indexed_fields` configuration of a type.
    ///
    /// A type without its own list inherits the nearest ancestor's.
    pub fn indexed_fields(&self, type_name: &str) -> &[IndexedField] {
        self.nearest(type_name, "indexed_fields", |m| m.indexed_fields.as_slice())
    }

    /// `dependent_classes` configuration of a type, inherited like
    /// [`indexed_fields`](Self::indexed_fields).
    pub fn dependent_classes(&self, type_name: &str) -> &[String] {
        self.nearest(type_name, "dependent_classes", |m| {
            m.dependent_classes.as_slice()
        })
    }

    /// First non-empty list along the parent chain.
    fn nearest<'a, T>(
        &'a self,
        type_name: &str,
        setting: &str,
        list: impl Fn(&'a ContentModel) -> &'a [T],
    ) -> &'a [T] {
        for model in self.ancestry(type_name) {
            let items = list(model);
            if items.is_empty() {
                continue;
            }
            if model.name != type_name {
                log::trace!("{type_name}: {setting} inherited from {}", model.name);
            }
            return items;
        }
        &[]
    }

    /// Declared and inherited columns, plus the fixed columns.
    ///
    /// Nearer declarations win over inherited ones.
    pub fn database_fields(&self, type_name: &str) -> BTreeMap<String, String> {
        let mut fields: BTreeMap<String, String> = FIXED_FIELDS
            .iter()
            .map(|(name, ty)| (name.to_string(), ty.to_string()))
            .collect();
        for model in self.ancestry(type_name).into_iter().rev() {
            fields.extend(model.fields.clone());
        }
        fields
    }

    /// Whether the type has a column called `field`.
    pub fn has_column(&self, type_name: &str, field: &str) -> bool {
        FIXED_FIELDS.iter().any(|(name, _)| *name == field)
            || self
                .ancestry(type_name)
                .iter()
                .any(|m| m.fields.contains_key(field))
    }

    /// Declared and inherited relations of every cardinality.
    ///
    /// When the same name is declared with several cardinalities,
    /// many-many wins over has-one, which wins over has-many.
    pub fn relations(&self, type_name: &str) -> BTreeMap<String, Relation> {
        let mut relations = BTreeMap::new();
        for model in self.ancestry(type_name).into_iter().rev() {
            for (kind, map) in [
                (RelationKind::HasMany, &model.has_many),
                (RelationKind::HasOne, &model.has_one),
                (RelationKind::ManyMany, &model.many_many),
            ] {
                for (name, target) in map {
                    relations.insert(
                        name.clone(),
                        Relation {
                            kind,
                            target: target.clone(),
                        },
                    );
                }
            }
        }
        relations
    }

    /// A single relation by name.
    pub fn relation(&self, type_name: &str, relation: &str) -> Option<Relation> {
        self.relations(type_name).remove(relation)
    }

    /// Accessor registered on the type or an ancestor.
    pub fn accessor(&self, type_name: &str, field: &str) -> Option<&Accessor> {
        self.ancestry(type_name)
            .into_iter()
            .find_map(|m| m.accessors.get(field))
    }

    /// Whether an accessor named `field` is registered for the type.
    pub fn has_accessor(&self, type_name: &str, field: &str) -> bool {
        self.accessor(type_name, field).is_some()
    }

    /// Read a field from an instance: accessor first, then column.
    ///
    /// Returns `None` when the type has neither.
    pub fn read(&self, instance: &Instance, field: &str) -> Option<Value> {
        if let Some(accessor) = self.accessor(&instance.type_name, field) {
            return Some(accessor(instance));
        }
        if self.has_column(&instance.type_name, field) {
            return Some(match field {
                "ID" => i64::try_from(instance.id)
                    .map(Value::Int)
                    .unwrap_or_else(|_| Value::Text(instance.id.to_string())),
                "ClassName" => Value::Text(instance.type_name.clone()),
                _ => instance.value(field).cloned().unwrap_or_default(),
            });
        }
        None
    }

    /// The type and every registered subtype.
    pub fn descendants_or_self(&self, type_name: &str) -> Vec<&str> {
        self.models
            .keys()
            .filter(|name| self.is_a(name, type_name))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModelRegistry {
        ModelRegistry::from_toml_str(
            r#"
            [[model]]
            name = "Page"
            fields = { Title = "Varchar(255)", ShowInSearch = "Boolean" }
            capabilities = { versioned = true, page_like = true, indexable = true }

            [[model]]
            name = "Article"
            parent = "Page"
            fields = { Title = "Text", Published = "Date" }
            has_one = { Author = "Person" }
            many_many = { Tags = "Tag" }
            indexed_fields = ["Title", "Author"]

            [[model]]
            name = "Person"
            fields = { Name = "Varchar" }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_load_from_toml() {
        let registry = sample();
        assert_eq!(registry.models().count(), 3);
        let article = registry.model("Article").unwrap();
        assert_eq!(article.indexed_fields[1], IndexedField::from("Author"));
    }

    #[test]
    fn test_indexed_fields_inherited_when_unset() {
        let registry = ModelRegistry::new([
            ContentModel::new("Page").index("Title").with_dependent("Index"),
            ContentModel::new("Article").with_parent("Page"),
            ContentModel::new("News").with_parent("Page").index("Summary"),
        ])
        .unwrap();

        assert_eq!(registry.indexed_fields("Article"), &[IndexedField::from("Title")]);
        assert_eq!(registry.indexed_fields("News"), &[IndexedField::from("Summary")]);
        assert_eq!(registry.dependent_classes("News"), &["Index".to_string()]);
        assert!(registry.indexed_fields("Ghost").is_empty());
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let err = ModelRegistry::new([ContentModel::new("Article").with_parent("Nope")]);
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let err = ModelRegistry::new([
            ContentModel::new("A").with_parent("B"),
            ContentModel::new("B").with_parent("A"),
        ]);
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn test_duplicate_model_rejected() {
        let err = ModelRegistry::new([ContentModel::new("A"), ContentModel::new("A")]);
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn test_database_fields_inherited_and_fixed() {
        let registry = sample();
        let fields = registry.database_fields("Article");

        assert_eq!(fields["Title"], "Text"); // child wins
        assert_eq!(fields["ShowInSearch"], "Boolean");
        assert_eq!(fields["Published"], "Date");
        assert_eq!(fields["ID"], "Int");
        assert_eq!(fields["LastEdited"], "SS_Datetime");
        assert!(registry.has_column("Article", "ShowInSearch"));
        assert!(!registry.has_column("Person", "ShowInSearch"));
    }

    #[test]
    fn test_capabilities_inherited() {
        let registry = sample();
        let caps = registry.capabilities("Article");
        assert!(caps.indexable && caps.page_like && caps.versioned);
        assert!(!registry.capabilities("Person").indexable);
        assert_eq!(registry.indexable().count(), 2);
    }

    #[test]
    fn test_relations_and_hierarchy() {
        let registry = sample();
        let relations = registry.relations("Article");
        assert_eq!(relations["Author"].kind, RelationKind::HasOne);
        assert_eq!(relations["Tags"].target, "Tag");
        assert!(registry.relation("Page", "Author").is_none());

        assert!(registry.is_a("Article", "Page"));
        assert!(!registry.is_a("Page", "Article"));
        assert_eq!(registry.root("Article"), "Page");
        assert_eq!(registry.descendants_or_self("Page"), vec!["Article", "Page"]);
    }

    #[test]
    fn test_read_prefers_accessor() {
        let mut registry = sample();
        registry
            .register_accessor("Page", "Title", |i| {
                Value::Text(format!("#{}", i.id))
            })
            .unwrap();

        let article = Instance::new("Article", 5).with("Title", "stored");
        assert_eq!(registry.read(&article, "Title"), Some(Value::from("#5")));
        assert_eq!(registry.read(&article, "ID"), Some(Value::Int(5)));
        assert_eq!(registry.read(&article, "Published"), Some(Value::Null));
        assert_eq!(registry.read(&article, "Nope"), None);
    }

    #[test]
    fn test_read_id_beyond_i64_range() {
        let registry = sample();
        let big = Instance::new("Person", u64::MAX);
        assert_eq!(
            registry.read(&big, "ID"),
            Some(Value::Text(u64::MAX.to_string()))
        );
        let max = Instance::new("Person", i64::MAX as u64);
        assert_eq!(registry.read(&max, "ID"), Some(Value::Int(i64::MAX)));
    }

    #[test]
    fn test_register_accessor_unknown_model() {
        let mut registry = sample();
        let err = registry.register_accessor("Ghost", "X", |_| Value::Null);
        assert!(matches!(err, Err(Error::NotFound { .. })));
    }
}
