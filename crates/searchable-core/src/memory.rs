//! In-memory content store.
//!
//! [`MemoryStore`] keeps a staged and a live table per base type. Reads of
//! versioned types in [`ReadMode::Live`] go to the live table; everything
//! else reads the staged table. It backs the CLI (loaded from a JSON
//! snapshot) and the test suites.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::instance::{Instance, InstanceId};
use crate::registry::ModelRegistry;
use crate::store::{ContentStore, ReadContext, ReadMode};
use crate::value::{FileRef, Value};

/// Column holding the on-disk location of file-like instances.
pub const FILENAME_FIELD: &str = "Filename";

type Table = BTreeMap<(String, InstanceId), Instance>;

/// Serialized contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Staged (draft) instances.
    #[serde(default)]
    pub stage: Vec<Instance>,
    /// Live (published) instances of versioned types.
    #[serde(default)]
    pub live: Vec<Instance>,
}

impl Snapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// In-memory [`ContentStore`].
pub struct MemoryStore {
    registry: Arc<ModelRegistry>,
    asset_root: PathBuf,
    stage: RwLock<Table>,
    live: RwLock<Table>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            asset_root: PathBuf::new(),
            stage: RwLock::new(Table::new()),
            live: RwLock::new(Table::new()),
        }
    }

    /// Resolve relative file paths against `root`.
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    /// Create a store holding the snapshot's instances.
    pub fn from_snapshot(registry: Arc<ModelRegistry>, snapshot: Snapshot) -> Result<Self> {
        let store = Self::new(registry);
        for instance in snapshot.stage {
            store.write(instance)?;
        }
        for instance in snapshot.live {
            store.write_live(instance)?;
        }
        Ok(store)
    }

    /// Write an instance to the staged table.
    pub fn write(&self, instance: Instance) -> Result<()> {
        let key = self.key(&instance.type_name, instance.id)?;
        self.stage
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, instance);
        Ok(())
    }

    /// Write an instance directly to the live table.
    pub fn write_live(&self, instance: Instance) -> Result<()> {
        let key = self.key(&instance.type_name, instance.id)?;
        self.live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, instance);
        Ok(())
    }

    /// Copy the staged variant of an instance to the live table.
    pub fn publish(&self, type_name: &str, id: InstanceId) -> Result<()> {
        let key = self.key(type_name, id)?;
        let staged = self
            .stage
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::not_found("instance", format!("{type_name}#{id}")))?;
        self.live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, staged);
        Ok(())
    }

    /// Remove the live variant of an instance.
    pub fn unpublish(&self, type_name: &str, id: InstanceId) -> Result<()> {
        let key = self.key(type_name, id)?;
        self.live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        Ok(())
    }

    /// Remove both variants of an instance.
    pub fn delete(&self, type_name: &str, id: InstanceId) -> Result<()> {
        let key = self.key(type_name, id)?;
        self.stage
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        self.live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        Ok(())
    }

    fn key(&self, type_name: &str, id: InstanceId) -> Result<(String, InstanceId)> {
        self.registry.model(type_name)?;
        Ok((self.registry.root(type_name).to_string(), id))
    }

    fn reads_live(&self, ctx: &ReadContext, type_name: &str) -> bool {
        ctx.mode() == ReadMode::Live && self.registry.capabilities(type_name).versioned
    }

    fn table(&self, ctx: &ReadContext, type_name: &str) -> &RwLock<Table> {
        if self.reads_live(ctx, type_name) {
            &self.live
        } else {
            &self.stage
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.asset_root.join(path)
        }
    }
}

impl ContentStore for MemoryStore {
    fn get(&self, ctx: &ReadContext, type_name: &str, id: InstanceId) -> Result<Option<Instance>> {
        let key = self.key(type_name, id)?;
        let table = self
            .table(ctx, type_name)
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(table
            .get(&key)
            .filter(|i| self.registry.is_a(&i.type_name, type_name))
            .cloned())
    }

    fn all(&self, ctx: &ReadContext, type_name: &str) -> Result<Vec<Instance>> {
        self.registry.model(type_name)?;
        let table = self
            .table(ctx, type_name)
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(table
            .values()
            .filter(|i| self.registry.is_a(&i.type_name, type_name))
            .cloned()
            .collect())
    }

    fn related_one(
        &self,
        ctx: &ReadContext,
        instance: &Instance,
        relation: &str,
    ) -> Result<Option<Instance>> {
        let Some(rel) = self.registry.relation(&instance.type_name, relation) else {
            return Ok(None);
        };
        match instance.linked(relation).first() {
            Some(id) => self.get(ctx, &rel.target, *id),
            None => Ok(None),
        }
    }

    fn related_many(
        &self,
        ctx: &ReadContext,
        instance: &Instance,
        relation: &str,
    ) -> Result<Vec<Instance>> {
        let Some(rel) = self.registry.relation(&instance.type_name, relation) else {
            return Ok(Vec::new());
        };
        let mut related = Vec::new();
        for id in instance.linked(relation) {
            if let Some(item) = self.get(ctx, &rel.target, id)? {
                related.push(item);
            }
        }
        Ok(related)
    }

    fn is_published(&self, instance: &Instance) -> Result<bool> {
        let key = self.key(&instance.type_name, instance.id)?;
        Ok(self
            .live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&key))
    }

    fn file(&self, ctx: &ReadContext, instance: &Instance, name: &str) -> Result<Option<FileRef>> {
        if let Some(Value::File(file)) = self.registry.read(instance, name) {
            return Ok(Some(FileRef::new(self.resolve_path(file.path()))));
        }

        let Some(rel) = self.registry.relation(&instance.type_name, name) else {
            return Ok(None);
        };
        if rel.kind.is_multi() {
            return Ok(None);
        }
        let Some(target) = self.related_one(ctx, instance, name)? else {
            return Ok(None);
        };
        if !self.registry.capabilities(&target.type_name).file {
            return Ok(None);
        }
        Ok(target
            .value(FILENAME_FIELD)
            .and_then(Value::as_text)
            .filter(|p| !p.is_empty())
            .map(|p| FileRef::new(self.resolve_path(Path::new(p)))))
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("asset_root", &self.asset_root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Capabilities, ContentModel, RelationKind};

    fn registry() -> Arc<ModelRegistry> {
        Arc::new(
            ModelRegistry::new([
                ContentModel::new("Page")
                    .with_field("Title", "Varchar")
                    .with_capabilities(Capabilities {
                        versioned: true,
                        page_like: true,
                        ..Default::default()
                    }),
                ContentModel::new("Article")
                    .with_parent("Page")
                    .with_relation(RelationKind::HasOne, "Report", "File")
                    .with_relation(RelationKind::ManyMany, "Tags", "Tag"),
                ContentModel::new("Tag").with_field("Name", "Varchar"),
                ContentModel::new("File")
                    .with_field("Filename", "Varchar")
                    .with_capabilities(Capabilities {
                        file: true,
                        ..Default::default()
                    }),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_stage_and_live_reads() {
        let store = MemoryStore::new(registry());
        store.write(Instance::new("Article", 1).with("Title", "Draft")).unwrap();

        let stage = ReadContext::default();
        let live = ReadContext::live();

        assert!(store.get(&stage, "Article", 1).unwrap().is_some());
        assert!(store.get(&live, "Article", 1).unwrap().is_none());

        store.publish("Article", 1).unwrap();
        let published = store.get(&live, "Page", 1).unwrap().unwrap();
        assert_eq!(published.type_name, "Article");
        assert!(store.is_published(&published).unwrap());

        store.unpublish("Article", 1).unwrap();
        assert!(!store.is_published(&published).unwrap());
    }

    #[test]
    fn test_unversioned_types_read_stage_in_live_mode() {
        let store = MemoryStore::new(registry());
        store.write(Instance::new("Tag", 4).with("Name", "rust")).unwrap();
        assert!(store.get(&ReadContext::live(), "Tag", 4).unwrap().is_some());
    }

    #[test]
    fn test_all_includes_subtypes() {
        let store = MemoryStore::new(registry());
        store.write(Instance::new("Page", 1)).unwrap();
        store.write(Instance::new("Article", 2)).unwrap();
        store.write(Instance::new("Tag", 1)).unwrap();

        let ctx = ReadContext::default();
        assert_eq!(store.all(&ctx, "Page").unwrap().len(), 2);
        assert_eq!(store.all(&ctx, "Article").unwrap().len(), 1);
        assert!(store.all(&ctx, "Ghost").is_err());
    }

    #[test]
    fn test_related_many_skips_missing() {
        let store = MemoryStore::new(registry());
        store.write(Instance::new("Tag", 1).with("Name", "a")).unwrap();
        store.write(Instance::new("Tag", 3).with("Name", "c")).unwrap();
        let article = Instance::new("Article", 9).link_many("Tags", vec![1, 2, 3]);
        store.write(article.clone()).unwrap();

        let tags = store
            .related_many(&ReadContext::default(), &article, "Tags")
            .unwrap();
        let ids: Vec<_> = tags.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_file_through_relation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.pdf"), b"%PDF").unwrap();

        let store = MemoryStore::new(registry()).with_asset_root(dir.path());
        store
            .write(Instance::new("File", 7).with(FILENAME_FIELD, "report.pdf"))
            .unwrap();
        let article = Instance::new("Article", 1).link_one("Report", 7);

        let file = store
            .file(&ReadContext::default(), &article, "Report")
            .unwrap()
            .unwrap();
        assert!(file.exists());
        assert_eq!(file.path(), dir.path().join("report.pdf"));

        let none = store
            .file(&ReadContext::default(), &article, "Tags")
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{"stage": [{"type": "Article", "id": 1, "values": {"Title": "Hi"}}],
                "live": [{"type": "Article", "id": 1, "values": {"Title": "Hi"}}]}"#,
        )
        .unwrap();
        let store = MemoryStore::from_snapshot(registry(), snapshot).unwrap();
        assert!(store
            .get(&ReadContext::live(), "Article", 1)
            .unwrap()
            .is_some());
    }
}
