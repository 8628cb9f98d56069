//! Search-side mapping for Searchable.
//!
//! This crate turns content models into search mappings and content instances
//! into search documents, and defines the engine those are pushed to. A
//! Tantivy engine is available behind a feature flag.
//!
//! # Features
//!
//! - `fts-tantivy`: Enable the Tantivy-backed engine (recommended)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      searchable-fts                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  mapper: primitive data type → FieldKind                    │
//! │  SchemaBuilder: ContentModel → IndexSchema                  │
//! │  DocumentSynthesizer: Instance → SearchDocument             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SearchEngine trait                                         │
//! │  ├── MemoryEngine (in-process, records calls)               │
//! │  └── TantivyEngine (one on-disk index per type)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use searchable_fts::{create_engine, DocumentSynthesizer, SchemaBuilder, SearchConfig};
//!
//! let config = SearchConfig::default();
//! let engine = create_engine(&config)?;
//!
//! let schema = SchemaBuilder::new(&registry, &config).build("Article")?;
//! engine.define(&schema)?;
//!
//! let doc = DocumentSynthesizer::new(&registry, &store, &config)
//!     .synthesize(&ReadContext::live(), &article, &schema)?;
//! engine.index(&doc)?;
//! engine.refresh()?;
//! ```

// Core modules (always available)
pub mod document;
pub mod engine;
pub mod mapper;
pub mod schema;
pub mod synthesizer;
pub mod types;

// Feature-gated Tantivy module
#[cfg(feature = "fts-tantivy")]
pub mod tantivy_engine;

// Re-exports
pub use document::{FieldValue, SearchDocument};
pub use engine::{create_engine, EngineCall, MemoryEngine, SearchEngine};
pub use mapper::map_primitive_type;
pub use schema::SchemaBuilder;
pub use synthesizer::{format_date, DocumentSynthesizer};
pub use types::{FieldSpec, IndexSchema, RelationNaming, SearchConfig, PUBLISHED_FIELD};

#[cfg(feature = "fts-tantivy")]
pub use tantivy_engine::TantivyEngine;
