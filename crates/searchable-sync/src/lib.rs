//! Lifecycle synchronisation for Searchable.
//!
//! This crate keeps a search engine in step with a content store:
//!
//! - [`service`]: `SearchService` (`define`, `refresh`, `index`, `remove`)
//! - [`visibility`]: index-or-remove predicates
//! - [`controller`]: `SyncController` lifecycle hooks and dependent fan-out
//! - [`reindex`]: `ReindexTask`, the bulk maintenance run
//!
//! Everything is synchronous: a hook returns once its engine calls have been
//! made.

#![forbid(unsafe_code)]

pub mod controller;
pub mod error;
pub mod reindex;
pub mod service;
pub mod visibility;

pub use controller::{SyncController, SyncReport};
pub use error::{Error, Result};
pub use reindex::{ReindexReport, ReindexTask};
pub use service::{IndexStats, SearchService};
pub use visibility::{should_index_after_write, should_index_dependent, SHOW_IN_SEARCH};
