//! Index-or-remove decisions.
//!
//! Page-like content is searchable only while its `ShowInSearch` column is
//! set. Other content is searchable unless it exposes a `ShowInSearch`
//! accessor returning a falsy value. Dependent-class fan-out ignores the
//! accessor and always indexes non-page-like content.

use searchable_core::{Instance, ModelRegistry};

/// Name of the show-in-search flag (column on page-like content, optional
/// accessor elsewhere).
pub const SHOW_IN_SEARCH: &str = "ShowInSearch";

/// Whether a freshly written instance should be indexed (`true`) or removed.
pub fn should_index_after_write(registry: &ModelRegistry, instance: &Instance) -> bool {
    let type_name = &instance.type_name;
    if registry.capabilities(type_name).page_like {
        return page_shows_in_search(registry, instance);
    }
    if registry.has_accessor(type_name, SHOW_IN_SEARCH) {
        return registry
            .read(instance, SHOW_IN_SEARCH)
            .is_some_and(|v| v.is_truthy());
    }
    true
}

/// Whether a dependent instance should be indexed (`true`) or removed during
/// fan-out.
pub fn should_index_dependent(registry: &ModelRegistry, instance: &Instance) -> bool {
    if registry.capabilities(&instance.type_name).page_like {
        page_shows_in_search(registry, instance)
    } else {
        true
    }
}

/// An unset flag takes the column default, which is on.
fn page_shows_in_search(registry: &ModelRegistry, instance: &Instance) -> bool {
    if registry.has_accessor(&instance.type_name, SHOW_IN_SEARCH) {
        return registry
            .read(instance, SHOW_IN_SEARCH)
            .is_some_and(|v| v.is_truthy());
    }
    instance.value(SHOW_IN_SEARCH).is_none_or(|v| v.is_truthy())
}

// ============================================================================
// Tests
// ============================================================================
