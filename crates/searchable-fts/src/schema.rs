//! Search schema derivation.
//!
//! [`SchemaBuilder`] turns a content model's `indexed_fields` configuration
//! into an [`IndexSchema`]:
//!
//! 1. The published flag, always first, as `boolean`.
//! 2. Own fields, in configuration order. An explicit type is used verbatim;
//!    otherwise the column's data type goes through the type mapper, and
//!    unmapped or unknown columns are dropped.
//! 3. One-hop relation fields, in configuration order, flattened as
//!    `relation_field`. Only relations whose target carries the indexable
//!    capability contribute; each of the target's indexed fields resolves its
//!    type from, in order:
//!    - an override on the referencing entry keyed by the related field name,
//!    - a self-keyed override on the related model's entry,
//!    - the related entry's own explicit type,
//!    - the related column's data type through the type mapper.
//!
//! An entry naming both an own field and a relation is treated as an own
//! field, and flattened names never replace own fields.

use searchable_core::{FieldKind, IndexedField, ModelRegistry, Result, TypeDescriptor};

use crate::mapper::map_primitive_type;
use crate::types::{FieldSpec, IndexSchema, RelationNaming, SearchConfig};

/// Derives search schemas from content models.
#[derive(Debug, Clone, Copy)]
pub struct SchemaBuilder<'a> {
    registry: &'a ModelRegistry,
    config: &'a SearchConfig,
}

impl<'a> SchemaBuilder<'a> {
    /// Create a builder over a registry.
    pub fn new(registry: &'a ModelRegistry, config: &'a SearchConfig) -> Self {
        Self { registry, config }
    }

    /// Build the schema for a type.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the type is not registered. Unmappable fields
    /// and relations are skipped, never reported.
    pub fn build(&self, type_name: &str) -> Result<IndexSchema> {
        self.registry.model(type_name)?;

        let mut schema = IndexSchema::new(type_name);
        schema.insert(FieldSpec::new(
            &self.config.published_field,
            FieldKind::Boolean,
        ));

        let entries = self.registry.indexed_fields(type_name);
        self.add_own_fields(type_name, entries, &mut schema);
        self.add_relation_fields(type_name, entries, &mut schema);

        Ok(schema)
    }

    fn add_own_fields(&self, type_name: &str, entries: &[IndexedField], schema: &mut IndexSchema) {
        let columns = self.registry.database_fields(type_name);

        for entry in entries {
            let name = entry.name();
            if name == self.config.published_field {
                continue;
            }

            if let Some(descriptor) = entry.explicit_type() {
                schema.insert(FieldSpec::from_descriptor(name, &descriptor));
                continue;
            }

            let Some(data_type) = columns.get(name) else {
                continue;
            };
            match map_primitive_type(data_type) {
                Some(kind) => schema.insert(FieldSpec::new(name, kind)),
                None => log::debug!("{type_name}.{name}: unmapped data type '{data_type}', skipped"),
            }
        }
    }

    fn add_relation_fields(
        &self,
        type_name: &str,
        entries: &[IndexedField],
        schema: &mut IndexSchema,
    ) {
        let relations = self.registry.relations(type_name);
        let naming = self.config.naming();

        for entry in entries {
            let name = entry.name();
            if self.is_own_field(type_name, entry) {
                continue;
            }
            let Some(relation) = relations.get(name) else {
                continue;
            };
            if self.registry.get(&relation.target).is_none() {
                log::debug!(
                    "{type_name}.{name}: related type '{}' is not registered, skipped",
                    relation.target
                );
                continue;
            }
            if !self.registry.capabilities(&relation.target).indexable {
                log::debug!(
                    "{type_name}.{name}: related type '{}' is not indexable, skipped",
                    relation.target
                );
                continue;
            }

            for related in self.registry.indexed_fields(&relation.target) {
                let flattened = naming.join(name, related.name());
                if schema.contains(&flattened) {
                    log::debug!("{type_name}.{flattened}: collides with an own field, skipped");
                    continue;
                }
                match self.related_descriptor(entry, &relation.target, related) {
                    Some(descriptor) => {
                        schema.insert(FieldSpec::from_descriptor(flattened, &descriptor))
                    }
                    None => log::debug!("{type_name}.{flattened}: no resolvable type, skipped"),
                }
            }
        }
    }

    /// Whether an entry resolves as an own field of the type.
    fn is_own_field(&self, type_name: &str, entry: &IndexedField) -> bool {
        entry.explicit_type().is_some() || self.registry.has_column(type_name, entry.name())
    }

    fn related_descriptor(
        &self,
        referencing: &IndexedField,
        related_type: &str,
        related: &IndexedField,
    ) -> Option<TypeDescriptor> {
        let field = related.name();
        referencing
            .related_override(field)
            .or_else(|| related.related_override(field))
            .cloned()
            .or_else(|| related.explicit_type())
            .or_else(|| {
                let columns = self.registry.database_fields(related_type);
                columns
                    .get(field)
                    .and_then(|data_type| map_primitive_type(data_type))
                    .map(TypeDescriptor::new)
            })
    }

    /// Naming scheme used for flattened relation fields.
    pub fn naming(&self) -> RelationNaming {
        self.config.naming()
    }
}

// ============================================================================
// Tests
// ============================================================================
