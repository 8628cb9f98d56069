//! Search service: the engine operations driven by lifecycle events.
//!
//! `SearchService` binds a model registry, a content store and a search
//! engine, and exposes the four operations the rest of the system uses:
//! `define`, `refresh`, `index` and `remove`. `populate` adds a bulk pass used
//! by the reindex orchestrator.

use std::sync::Arc;

use searchable_core::{ContentStore, Instance, ModelRegistry, ReadContext, Result};
use searchable_fts::{DocumentSynthesizer, IndexSchema, SchemaBuilder, SearchConfig, SearchEngine};

use crate::visibility::should_index_after_write;

/// Statistics about a bulk indexing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Documents sent to `index`.
    pub documents_indexed: usize,
    /// Documents sent to `remove`.
    pub documents_removed: usize,
}

/// Drives a search engine from content held in a store.
#[derive(Clone)]
pub struct SearchService {
    registry: Arc<ModelRegistry>,
    store: Arc<dyn ContentStore>,
    engine: Arc<dyn SearchEngine>,
    config: SearchConfig,
}

impl SearchService {
    /// Create a service.
    pub fn new(
        registry: Arc<ModelRegistry>,
        store: Arc<dyn ContentStore>,
        engine: Arc<dyn SearchEngine>,
        config: SearchConfig,
    ) -> Self {
        Self {
            registry,
            store,
            engine,
            config,
        }
    }

    /// The model registry.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// The content store.
    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    /// The search engine.
    pub fn engine(&self) -> &dyn SearchEngine {
        self.engine.as_ref()
    }

    /// The search configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Build the search schema of a type.
    pub fn schema(&self, type_name: &str) -> Result<IndexSchema> {
        SchemaBuilder::new(&self.registry, &self.config).build(type_name)
    }

    /// Push the schema of every indexable type to the engine.
    ///
    /// Returns the schemas that were defined, in registry order.
    pub fn define(&self) -> Result<Vec<IndexSchema>> {
        let mut defined = Vec::new();
        for model in self.registry.indexable() {
            let schema = self.schema(&model.name)?;
            if schema.is_empty() {
                log::debug!("{}: empty schema, not defined", model.name);
                continue;
            }
            self.engine.define(&schema)?;
            log::info!("Defined {} ({} fields)", schema.type_name, schema.len());
            defined.push(schema);
        }
        Ok(defined)
    }

    /// Make staged engine writes visible.
    pub fn refresh(&self) -> Result<()> {
        self.engine.refresh()?;
        log::info!("Refreshed {} engine", self.engine.name());
        Ok(())
    }

    /// Synthesize and upsert the document of an instance.
    pub fn index(&self, ctx: &ReadContext, instance: &Instance) -> Result<()> {
        let schema = self.schema(&instance.type_name)?;
        let document = DocumentSynthesizer::new(&self.registry, self.store.as_ref(), &self.config)
            .synthesize(ctx, instance, &schema)?;
        log::debug!("Indexing {}#{}", instance.type_name, instance.id);
        self.engine.index(&document)
    }

    /// Delete the document of an instance.
    pub fn remove(&self, instance: &Instance) -> Result<()> {
        log::debug!("Removing {}#{}", instance.type_name, instance.id);
        self.engine.remove(&instance.type_name, instance.id)
    }

    /// Index or remove every instance of every indexable type.
    ///
    /// Instances are enumerated from the staged store; each is indexed in its
    /// published variant when one exists, following the same visibility rule
    /// as a single write.
    pub fn populate(&self) -> Result<IndexStats> {
        let stage = ReadContext::default();
        let live = ReadContext::live();
        let mut stats = IndexStats::default();

        for model in self.registry.indexable() {
            for instance in self.store.all(&stage, &model.name)? {
                // Subtypes are visited under their own model.
                if instance.type_name != model.name {
                    continue;
                }
                let target = self
                    .store
                    .get(&live, &instance.type_name, instance.id)?
                    .unwrap_or(instance);
                if should_index_after_write(&self.registry, &target) {
                    self.index(&live, &target)?;
                    stats.documents_indexed += 1;
                } else {
                    self.remove(&target)?;
                    stats.documents_removed += 1;
                }
            }
        }
        Ok(stats)
    }
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("engine", &self.engine.name())
            .field("config", &self.config)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use searchable_core::{Capabilities, ContentModel, MemoryStore};
    use searchable_fts::{EngineCall, FieldValue, MemoryEngine};

    fn indexable() -> Capabilities {
        Capabilities {
            indexable: true,
            ..Default::default()
        }
    }

    fn setup() -> (SearchService, Arc<MemoryStore>, Arc<MemoryEngine>) {
        let registry = Arc::new(
            ModelRegistry::new([
                ContentModel::new("Page")
                    .with_field("Title", "Varchar")
                    .with_field("ShowInSearch", "Boolean")
                    .with_capabilities(Capabilities {
                        indexable: true,
                        versioned: true,
                        page_like: true,
                        file: false,
                    })
                    .index("Title"),
                ContentModel::new("NewsPage").with_parent("Page"),
                ContentModel::new("Note")
                    .with_field("Body", "Text")
                    .with_capabilities(indexable())
                    .index("Body"),
                ContentModel::new("Draft").with_field("Body", "Text"),
            ])
            .unwrap(),
        );
        let store = Arc::new(MemoryStore::new(registry.clone()));
        let engine = Arc::new(MemoryEngine::new());
        let service = SearchService::new(
            registry,
            store.clone(),
            engine.clone(),
            SearchConfig::default(),
        );
        (service, store, engine)
    }

    #[test]
    fn test_define_covers_indexable_types() {
        let (service, _, engine) = setup();
        let defined = service.define().unwrap();
        let names: Vec<_> = defined.iter().map(|s| s.type_name.as_str()).collect();
        assert_eq!(names, vec!["NewsPage", "Note", "Page"]);
        assert!(engine.schema("Draft").is_none());
        assert_eq!(engine.schema("NewsPage").unwrap().len(), 2);
    }

    #[test]
    fn test_define_is_rerunnable() {
        let (service, _, engine) = setup();
        let first = service.define().unwrap();
        let second = service.define().unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.schema("Note"), Some(first[1].clone()));
    }

    #[test]
    fn test_index_and_remove() {
        let (service, _, engine) = setup();
        let note = Instance::new("Note", 3).with("Body", "text");

        service.index(&ReadContext::default(), &note).unwrap();
        service.remove(&note).unwrap();
        service.refresh().unwrap();

        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::Index {
                    type_name: "Note".into(),
                    id: 3
                },
                EngineCall::Remove {
                    type_name: "Note".into(),
                    id: 3
                },
                EngineCall::Refresh,
            ]
        );
    }

    #[test]
    fn test_populate_uses_published_variant() {
        let (service, store, engine) = setup();
        store
            .write(Instance::new("Page", 1).with("Title", "Live title"))
            .unwrap();
        store.publish("Page", 1).unwrap();
        store
            .write(Instance::new("Page", 1).with("Title", "Draft title"))
            .unwrap();
        store
            .write(Instance::new("NewsPage", 2).with("ShowInSearch", false))
            .unwrap();
        store.write(Instance::new("Note", 3).with("Body", "hi")).unwrap();
        store.write(Instance::new("Draft", 4)).unwrap();

        let stats = service.populate().unwrap();
        service.refresh().unwrap();

        assert_eq!(
            stats,
            IndexStats {
                documents_indexed: 2,
                documents_removed: 1,
            }
        );
        let page = engine.document("Page", 1).unwrap();
        assert_eq!(page.get("Title"), Some(&FieldValue::from("Live title")));
        assert_eq!(page.get("SS_Published"), Some(&FieldValue::Bool(true)));
        assert_eq!(engine.removed(), vec![("NewsPage".to_string(), 2)]);
        assert!(engine.document("Note", 3).is_some());
    }
}
