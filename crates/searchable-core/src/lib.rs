//! Searchable Core - shared types, traits, errors, and the model registry.
//!
//! This crate provides the foundational types used across all Searchable
//! crates. It has no internal Searchable dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`kind`]: Search field kinds and explicit type descriptors
//! - [`model`]: Content model definitions and capability tags
//! - [`registry`]: Model registry (inheritance, relations, accessors)
//! - [`instance`]: Content instances
//! - [`value`]: Raw field values and file references
//! - [`store`]: Content store capabilities and read contexts
//! - [`memory`]: In-memory content store

#![forbid(unsafe_code)]

pub mod error;
pub mod instance;
pub mod kind;
pub mod memory;
pub mod model;
pub mod registry;
pub mod store;
pub mod value;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use instance::{Instance, InstanceId, Link};
pub use kind::{FieldKind, IndexingHints, TypeDescriptor};
pub use memory::{MemoryStore, Snapshot};
pub use model::{
    Accessor, Capabilities, ContentModel, FieldConfig, IndexedField, Relation, RelationKind,
};
pub use registry::ModelRegistry;
pub use store::{ContentStore, ReadContext, ReadMode};
pub use value::{FileRef, Value};
