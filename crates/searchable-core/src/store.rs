//! Content store capabilities.
//!
//! The search layer never owns content; it reads through [`ContentStore`].
//! Every read takes a [`ReadContext`] selecting the staged or the live
//! variant of versioned content. Contexts are plain values passed down the
//! call chain, so switching to live reads for one operation never changes
//! what any other caller sees.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::instance::{Instance, InstanceId};
use crate::value::FileRef;

/// Which variant of versioned content to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// Draft content.
    #[default]
    Stage,
    /// Published content.
    Live,
}

impl fmt::Display for ReadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadMode::Stage => f.write_str("Stage.Stage"),
            ReadMode::Live => f.write_str("Stage.Live"),
        }
    }
}

/// Read context threaded through every store access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadContext {
    mode: ReadMode,
}

impl ReadContext {
    /// Context reading the given variant.
    pub fn new(mode: ReadMode) -> Self {
        Self { mode }
    }

    /// Context reading live content.
    pub fn live() -> Self {
        Self::new(ReadMode::Live)
    }

    /// Current read mode.
    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// A copy of this context reading `mode` instead.
    pub fn with_mode(&self, mode: ReadMode) -> Self {
        Self { mode }
    }
}

/// Capabilities the search layer needs from the primary object store.
pub trait ContentStore: Send + Sync {
    /// Fetch one instance of `type_name` (or a subtype) by id.
    fn get(&self, ctx: &ReadContext, type_name: &str, id: InstanceId) -> Result<Option<Instance>>;

    /// Every instance of `type_name` and its subtypes.
    fn all(&self, ctx: &ReadContext, type_name: &str) -> Result<Vec<Instance>>;

    /// Resolve a single-valued relation.
    fn related_one(
        &self,
        ctx: &ReadContext,
        instance: &Instance,
        relation: &str,
    ) -> Result<Option<Instance>>;

    /// Resolve a multi-valued relation. Missing targets are left out.
    fn related_many(
        &self,
        ctx: &ReadContext,
        instance: &Instance,
        relation: &str,
    ) -> Result<Vec<Instance>>;

    /// Whether a live variant of the instance exists.
    fn is_published(&self, instance: &Instance) -> Result<bool>;

    /// Resolve a file-like object exposed by the instance under `name`.
    fn file(&self, ctx: &ReadContext, instance: &Instance, name: &str) -> Result<Option<FileRef>>;
}
