//! Lifecycle hooks keeping the index in step with the content store.
//!
//! | Event | Action |
//! |---|---|
//! | after write | read the published variant, index or remove it, then fan out |
//! | after delete | remove, then fan out |
//! | many-many add/remove | fan out only |
//!
//! Fan-out visits every instance of each dependent class declared on the
//! written type and indexes or removes it. It is synchronous and runs after
//! the primary index/remove call; a failure part way through leaves the
//! dependents already processed in their new state.
//!
//! The write hook reads through a live copy of the caller's [`ReadContext`];
//! the caller's context is never modified.

use std::sync::Arc;

use searchable_core::{Instance, ReadContext, ReadMode, Result};

use crate::service::SearchService;
use crate::visibility::{should_index_after_write, should_index_dependent};

/// Engine calls made by one lifecycle hook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Documents indexed (primary and dependents).
    pub indexed: usize,
    /// Documents removed (primary and dependents).
    pub removed: usize,
    /// Dependent instances passed over because their type is not indexable.
    pub skipped: usize,
}

impl SyncReport {
    /// Total `index` and `remove` calls.
    pub fn calls(&self) -> usize {
        self.indexed + self.removed
    }
}

/// Reacts to content lifecycle events.
#[derive(Debug, Clone)]
pub struct SyncController {
    service: Arc<SearchService>,
}

impl SyncController {
    /// Create a controller driving `service`.
    pub fn new(service: Arc<SearchService>) -> Self {
        Self { service }
    }

    /// The underlying service.
    pub fn service(&self) -> &SearchService {
        &self.service
    }

    /// Handle an insert or update of `instance`.
    ///
    /// The published variant is indexed when it exists; otherwise the given
    /// instance is. Types without the indexable capability are ignored.
    pub fn on_after_write(&self, ctx: &ReadContext, instance: &Instance) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        if !self.is_indexable(instance) {
            return Ok(report);
        }

        let live = ctx.with_mode(ReadMode::Live);
        let target = self
            .service
            .store()
            .get(&live, &instance.type_name, instance.id)?
            .unwrap_or_else(|| instance.clone());

        if should_index_after_write(self.service.registry(), &target) {
            self.service.index(&live, &target)?;
            report.indexed += 1;
        } else {
            self.service.remove(&target)?;
            report.removed += 1;
        }

        self.update_dependents(&live, &instance.type_name, &mut report)?;
        Ok(report)
    }

    /// Handle deletion of `instance`.
    pub fn on_after_delete(&self, ctx: &ReadContext, instance: &Instance) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        if !self.is_indexable(instance) {
            return Ok(report);
        }

        self.service.remove(instance)?;
        report.removed += 1;

        self.update_dependents(ctx, &instance.type_name, &mut report)?;
        Ok(report)
    }

    /// Handle `instance` being added to a many-many relation.
    pub fn on_after_many_many_add(&self, ctx: &ReadContext, instance: &Instance) -> Result<SyncReport> {
        self.relation_changed(ctx, instance)
    }

    /// Handle `instance` being removed from a many-many relation.
    pub fn on_after_many_many_remove(
        &self,
        ctx: &ReadContext,
        instance: &Instance,
    ) -> Result<SyncReport> {
        self.relation_changed(ctx, instance)
    }

    fn relation_changed(&self, ctx: &ReadContext, instance: &Instance) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        if self.is_indexable(instance) {
            self.update_dependents(ctx, &instance.type_name, &mut report)?;
        }
        Ok(report)
    }

    fn is_indexable(&self, instance: &Instance) -> bool {
        let indexable = self
            .service
            .registry()
            .capabilities(&instance.type_name)
            .indexable;
        if !indexable {
            log::debug!("{}: not indexable, hook ignored", instance.type_name);
        }
        indexable
    }

    /// Re-index every instance of each dependent class of `type_name`.
    fn update_dependents(
        &self,
        ctx: &ReadContext,
        type_name: &str,
        report: &mut SyncReport,
    ) -> Result<()> {
        let registry = self.service.registry();

        for class in registry.dependent_classes(type_name) {
            if registry.get(class).is_none() {
                log::warn!("{type_name}: dependent class '{class}' is not registered");
                continue;
            }

            for object in self.service.store().all(ctx, class)? {
                if !registry.capabilities(&object.type_name).indexable {
                    report.skipped += 1;
                    continue;
                }
                if should_index_dependent(registry, &object) {
                    self.service.index(ctx, &object)?;
                    report.indexed += 1;
                } else {
                    self.service.remove(&object)?;
                    report.removed += 1;
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
