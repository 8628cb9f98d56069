//! Reindex orchestration.
//!
//! [`ReindexTask`] defines the mapping of every indexable type, repopulates
//! the index from the content store, and refreshes it, printing progress
//! lines as it goes. Any failure aborts the run.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use searchable_fts::IndexSchema;

use crate::error::Result;
use crate::service::{IndexStats, SearchService};

const SEPARATOR: &str = "#####################################";

/// Outcome of a reindex run.
#[derive(Debug, Clone)]
pub struct ReindexReport {
    /// Schemas pushed to the engine.
    pub schemas: Vec<IndexSchema>,
    /// Documents indexed and removed while repopulating.
    pub stats: IndexStats,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Defines and refreshes the search index.
#[derive(Debug, Clone)]
pub struct ReindexTask {
    service: Arc<SearchService>,
}

impl ReindexTask {
    /// Create a task for `service`.
    pub fn new(service: Arc<SearchService>) -> Self {
        Self { service }
    }

    /// Run the task, writing progress lines to `out`.
    pub fn run(&self, out: &mut impl Write) -> Result<ReindexReport> {
        let start = Instant::now();

        writeln!(out, "Defining the mappings")?;
        let schemas = self.service.define()?;

        writeln!(out, "Indexing the content")?;
        let stats = self.service.populate()?;
        writeln!(
            out,
            "Indexed {} documents, removed {}",
            stats.documents_indexed, stats.documents_removed
        )?;

        writeln!(out, "Refreshing the index")?;
        self.service.refresh()?;

        let elapsed = start.elapsed();
        writeln!(out, "{SEPARATOR}")?;
        writeln!(out, "Finished in {} seconds", elapsed.as_secs_f64())?;
        out.flush()?;

        log::info!(
            "Reindex finished: {} types, {} indexed, {} removed",
            schemas.len(),
            stats.documents_indexed,
            stats.documents_removed
        );
        Ok(ReindexReport {
            schemas,
            stats,
            elapsed,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use searchable_core::{Capabilities, ContentModel, Instance, MemoryStore, ModelRegistry};
    use searchable_fts::{EngineCall, MemoryEngine, SearchConfig};

    fn setup() -> (ReindexTask, Arc<MemoryStore>, Arc<MemoryEngine>) {
        let registry = Arc::new(
            ModelRegistry::new([ContentModel::new("Note")
                .with_field("Body", "Text")
                .with_capabilities(Capabilities {
                    indexable: true,
                    ..Default::default()
                })
                .index("Body")])
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
        (ReindexTask::new(Arc::new(service)), store, engine)
    }

    #[test]
    fn test_run_prints_progress() {
        let (task, store, _) = setup();
        store.write(Instance::new("Note", 1).with("Body", "x")).unwrap();

        let mut out = Vec::new();
        let report = task.run(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "Defining the mappings");
        assert_eq!(lines[1], "Indexing the content");
        assert_eq!(lines[2], "Indexed 1 documents, removed 0");
        assert_eq!(lines[3], "Refreshing the index");
        assert_eq!(lines[4], SEPARATOR);
        assert!(lines[5].starts_with("Finished in "));
        assert!(lines[5].ends_with(" seconds"));
        assert_eq!(report.schemas.len(), 1);
    }

    #[test]
    fn test_run_defines_before_refresh() {
        let (task, store, engine) = setup();
        store.write(Instance::new("Note", 1)).unwrap();

        task.run(&mut std::io::sink()).unwrap();
        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::Define("Note".into()),
                EngineCall::Index {
                    type_name: "Note".into(),
                    id: 1
                },
                EngineCall::Refresh,
            ]
        );
        assert!(engine.document("Note", 1).is_some());
    }

    #[test]
    fn test_run_is_rerunnable() {
        let (task, store, engine) = setup();
        store.write(Instance::new("Note", 1)).unwrap();
        task.run(&mut std::io::sink()).unwrap();
        task.run(&mut std::io::sink()).unwrap();
        assert_eq!(engine.len(), 1);
    }
}
