//! Search engine trait and factory.
//!
//! This module defines the `SearchEngine` trait the synchronisation layer
//! drives, plus an in-memory implementation.
//!
//! # Engines
//!
//! - `TantivyEngine`: on-disk Tantivy indexes, one per type (requires the
//!   `fts-tantivy` feature)
//! - `MemoryEngine`: in-process document map that also records every call,
//!   used as a fallback and by tests
//!
//! # Visibility
//!
//! `index` and `remove` are staged; they become visible to readers after the
//! next `refresh`.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use searchable_core::{Error, InstanceId, Result};

use crate::document::SearchDocument;
use crate::types::{IndexSchema, SearchConfig};

/// Abstract search engine.
///
/// All operations block until the engine has accepted them.
pub trait SearchEngine: Send + Sync {
    /// Declare (or re-declare) the field mapping of one type.
    ///
    /// Must be idempotent: defining an unchanged schema again is a no-op.
    fn define(&self, schema: &IndexSchema) -> Result<()>;

    /// Upsert a document, keyed by type and id.
    fn index(&self, document: &SearchDocument) -> Result<()>;

    /// Remove a document. Removing an unknown document is not an error.
    fn remove(&self, type_name: &str, id: InstanceId) -> Result<()>;

    /// Make staged changes visible.
    fn refresh(&self) -> Result<()>;

    /// Engine name for diagnostics.
    fn name(&self) -> &str;
}

/// Create a search engine based on configuration.
///
/// Selection logic:
/// 1. `"tantivy"` with the `fts-tantivy` feature and an `index_path` →
///    `TantivyEngine`
/// 2. `"tantivy"` otherwise → `MemoryEngine`, with a warning
/// 3. `"memory"` → `MemoryEngine`
///
/// # Errors
///
/// Returns a configuration error for an unknown backend name, or the
/// Tantivy engine's error when its root directory cannot be prepared.
pub fn create_engine(config: &SearchConfig) -> Result<Box<dyn SearchEngine>> {
    match config.backend.as_str() {
        "tantivy" => {
            #[cfg(feature = "fts-tantivy")]
            if let Some(ref index_path) = config.index_path {
                let engine = crate::tantivy_engine::TantivyEngine::new(index_path)?;
                return Ok(Box::new(engine));
            }
            log::warn!("Tantivy engine unavailable (feature or index_path missing), using memory engine");
            Ok(Box::new(MemoryEngine::new()))
        }
        "memory" => Ok(Box::new(MemoryEngine::new())),
        other => Err(Error::config(format!("unknown search backend '{other}'"))),
    }
}

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    /// `define` for a type.
    Define(String),
    /// `index` of a document.
    Index {
        /// Document type.
        type_name: String,
        /// Document id.
        id: InstanceId,
    },
    /// `remove` of a document.
    Remove {
        /// Document type.
        type_name: String,
        /// Document id.
        id: InstanceId,
    },
    /// `refresh`.
    Refresh,
}

type DocKey = (String, InstanceId);

#[derive(Default)]
struct MemoryState {
    calls: Vec<EngineCall>,
    schemas: BTreeMap<String, IndexSchema>,
    pending: Vec<(DocKey, Option<SearchDocument>)>,
    visible: BTreeMap<DocKey, SearchDocument>,
}

/// In-memory search engine.
///
/// Keeps defined schemas and documents in process memory and records every
/// call in order, so callers can assert on exactly what reached the engine.
#[derive(Default)]
pub struct MemoryEngine {
    state: Mutex<MemoryState>,
}

impl MemoryEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state().calls.clone()
    }

    /// Forget recorded calls, keeping schemas and documents.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Ids passed to `index`, in call order.
    pub fn indexed(&self) -> Vec<(String, InstanceId)> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Index { type_name, id } => Some((type_name.clone(), *id)),
                _ => None,
            })
            .collect()
    }

    /// Ids passed to `remove`, in call order.
    pub fn removed(&self) -> Vec<(String, InstanceId)> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Remove { type_name, id } => Some((type_name.clone(), *id)),
                _ => None,
            })
            .collect()
    }

    /// Schema defined for a type.
    pub fn schema(&self, type_name: &str) -> Option<IndexSchema> {
        self.state().schemas.get(type_name).cloned()
    }

    /// Visible document by type and id.
    pub fn document(&self, type_name: &str, id: InstanceId) -> Option<SearchDocument> {
        self.state()
            .visible
            .get(&(type_name.to_string(), id))
            .cloned()
    }

    /// Most recent staged or visible version of a document.
    pub fn latest(&self, type_name: &str, id: InstanceId) -> Option<SearchDocument> {
        let state = self.state();
        let key = (type_name.to_string(), id);
        match state.pending.iter().rev().find(|(k, _)| *k == key) {
            Some((_, doc)) => doc.clone(),
            None => state.visible.get(&key).cloned(),
        }
    }

    /// Number of visible documents.
    pub fn len(&self) -> usize {
        self.state().visible.len()
    }

    /// Whether no document is visible.
    pub fn is_empty(&self) -> bool {
        self.state().visible.is_empty()
    }
}

impl SearchEngine for MemoryEngine {
    fn define(&self, schema: &IndexSchema) -> Result<()> {
        let mut state = self.state();
        state.calls.push(EngineCall::Define(schema.type_name.clone()));
        state
            .schemas
            .insert(schema.type_name.clone(), schema.clone());
        Ok(())
    }

    fn index(&self, document: &SearchDocument) -> Result<()> {
        let mut state = self.state();
        state.calls.push(EngineCall::Index {
            type_name: document.type_name.clone(),
            id: document.id,
        });
        state.pending.push((
            (document.type_name.clone(), document.id),
            Some(document.clone()),
        ));
        Ok(())
    }

    fn remove(&self, type_name: &str, id: InstanceId) -> Result<()> {
        let mut state = self.state();
        state.calls.push(EngineCall::Remove {
            type_name: type_name.to_string(),
            id,
        });
        state.pending.push(((type_name.to_string(), id), None));
        Ok(())
    }

    fn refresh(&self) -> Result<()> {
        let mut state = self.state();
        state.calls.push(EngineCall::Refresh);
        let pending = std::mem::take(&mut state.pending);
        for (key, doc) in pending {
            match doc {
                Some(doc) => {
                    state.visible.insert(key, doc);
                }
                None => {
                    state.visible.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("MemoryEngine")
            .field("schemas", &state.schemas.len())
            .field("documents", &state.visible.len())
            .field("pending", &state.pending.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FieldValue;
    use crate::types::FieldSpec;
    use searchable_core::FieldKind;

    fn doc(id: InstanceId, title: &str) -> SearchDocument {
        let mut doc = SearchDocument::new("Article", id);
        doc.set("Title", FieldValue::from(title));
        doc
    }

    #[test]
    fn test_memory_engine_records_calls() {
        let engine = MemoryEngine::new();
        let mut schema = IndexSchema::new("Article");
        schema.insert(FieldSpec::new("Title", FieldKind::Text));

        engine.define(&schema).unwrap();
        engine.index(&doc(1, "a")).unwrap();
        engine.remove("Article", 2).unwrap();
        engine.refresh().unwrap();

        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::Define("Article".into()),
                EngineCall::Index {
                    type_name: "Article".into(),
                    id: 1
                },
                EngineCall::Remove {
                    type_name: "Article".into(),
                    id: 2
                },
                EngineCall::Refresh,
            ]
        );
        assert_eq!(engine.schema("Article"), Some(schema));
        assert_eq!(engine.indexed(), vec![("Article".to_string(), 1)]);
        assert_eq!(engine.removed(), vec![("Article".to_string(), 2)]);
    }

    #[test]
    fn test_memory_engine_visibility_after_refresh() {
        let engine = MemoryEngine::new();
        engine.index(&doc(1, "first")).unwrap();
        assert!(engine.document("Article", 1).is_none());
        assert_eq!(engine.latest("Article", 1), Some(doc(1, "first")));

        engine.refresh().unwrap();
        assert_eq!(engine.document("Article", 1), Some(doc(1, "first")));

        engine.index(&doc(1, "second")).unwrap();
        engine.refresh().unwrap();
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.document("Article", 1), Some(doc(1, "second")));

        engine.remove("Article", 1).unwrap();
        assert!(engine.latest("Article", 1).is_none());
        engine.refresh().unwrap();
        assert!(engine.is_empty());
    }

    #[test]
    fn test_memory_engine_remove_unknown_is_ok() {
        let engine = MemoryEngine::new();
        assert!(engine.remove("Article", 99).is_ok());
        assert!(engine.refresh().is_ok());
    }

    #[test]
    fn test_clear_calls_keeps_documents() {
        let engine = MemoryEngine::new();
        engine.index(&doc(1, "a")).unwrap();
        engine.refresh().unwrap();
        engine.clear_calls();
        assert!(engine.calls().is_empty());
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_create_engine() {
        let memory = SearchConfig {
            backend: "memory".into(),
            ..Default::default()
        };
        assert_eq!(create_engine(&memory).unwrap().name(), "memory");

        // No index_path: falls back to memory.
        let tantivy = SearchConfig::default();
        assert_eq!(create_engine(&tantivy).unwrap().name(), "memory");

        let unknown = SearchConfig {
            backend: "solr".into(),
            ..Default::default()
        };
        assert!(matches!(create_engine(&unknown), Err(Error::Config(_))));
    }
}
