//! Document synthesis.
//!
//! [`DocumentSynthesizer`] builds a [`SearchDocument`] for one content
//! instance against its [`IndexSchema`]. For every schema field it tries, in
//! order:
//!
//! 1. an own column or accessor of the instance;
//! 2. a flattened relation field `relation_field`:
//!    - single-valued relations read the related column, or attach a file by
//!      path for `attachment` fields;
//!    - list relations collect one value per related instance, embedding
//!      attachment bytes as base64, and set the field only when at least one
//!      value was produced.
//!
//! Fields that resolve to nothing are left out of the document. `date` fields
//! are normalized to `YYYY-MM-DDTHH:MM:SS`; values that do not parse as dates
//! are left out too.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use searchable_core::{
    ContentStore, FieldKind, Instance, ModelRegistry, ReadContext, Result, Value,
};

use crate::document::{FieldValue, SearchDocument};
use crate::types::{IndexSchema, SearchConfig};

/// Canonical output format of `date` fields.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DATETIME_INPUT_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Normalize a timestamp-like value to `YYYY-MM-DDTHH:MM:SS`.
///
/// Accepts datetime strings (with or without seconds, fractions or an RFC 3339
/// offset, which is dropped without conversion), plain dates (midnight), and
/// integer Unix timestamps. Falsy or unparseable input yields `None`.
pub fn format_date(value: &Value) -> Option<String> {
    if !value.is_truthy() {
        return None;
    }
    let parsed = match value {
        Value::Text(s) => parse_datetime(s.trim()),
        Value::Int(ts) => DateTime::from_timestamp(*ts, 0).map(|dt| dt.naive_utc()),
        _ => None,
    };
    parsed.map(|dt| dt.format(DATE_FORMAT).to_string())
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Apply kind-specific formatting to a raw value.
///
/// `date` fields are normalized; every other kind passes the value through.
pub fn format_value(kind: FieldKind, value: Value) -> Option<FieldValue> {
    match kind {
        FieldKind::Date => format_date(&value).map(FieldValue::Date),
        _ => FieldValue::from_value(value),
    }
}

/// Builds search documents from content instances.
#[derive(Clone, Copy)]
pub struct DocumentSynthesizer<'a> {
    registry: &'a ModelRegistry,
    store: &'a dyn ContentStore,
    config: &'a SearchConfig,
}

impl<'a> DocumentSynthesizer<'a> {
    /// Create a synthesizer reading through `store`.
    pub fn new(
        registry: &'a ModelRegistry,
        store: &'a dyn ContentStore,
        config: &'a SearchConfig,
    ) -> Self {
        Self {
            registry,
            store,
            config,
        }
    }

    /// Synthesize the document for `instance`.
    ///
    /// # Errors
    ///
    /// Store failures and attachment read failures propagate. Fields that
    /// cannot be resolved are omitted, not reported.
    pub fn synthesize(
        &self,
        ctx: &ReadContext,
        instance: &Instance,
        schema: &IndexSchema,
    ) -> Result<SearchDocument> {
        let mut document = SearchDocument::new(&instance.type_name, instance.id);
        let published = &self.config.published_field;
        document.set(published, FieldValue::Bool(self.is_live(instance)?));

        let relations = self.registry.relations(&instance.type_name);
        let naming = self.config.naming();

        for spec in &schema.fields {
            if &spec.name == published {
                continue;
            }

            if let Some(raw) = self.registry.read(instance, &spec.name) {
                if let Some(value) = format_value(spec.kind, raw) {
                    document.set(&spec.name, value);
                }
                continue;
            }

            let Some((relation, field)) =
                naming.split(&spec.name, relations.keys().map(String::as_str))
            else {
                continue;
            };
            let Some(kind) = relations.get(relation).map(|r| r.kind) else {
                continue;
            };

            let value = if kind.is_multi() {
                self.list_value(ctx, instance, relation, field, spec.kind)?
            } else {
                self.single_value(ctx, instance, relation, field, spec.kind)?
            };
            if let Some(value) = value {
                document.set(&spec.name, value);
            }
        }

        Ok(document)
    }

    /// Published flag: page-like versioned content is live only once
    /// published; everything else is always live.
    pub fn is_live(&self, instance: &Instance) -> Result<bool> {
        let caps = self.registry.capabilities(&instance.type_name);
        if caps.versioned && caps.page_like {
            self.store.is_published(instance)
        } else {
            Ok(true)
        }
    }

    fn single_value(
        &self,
        ctx: &ReadContext,
        instance: &Instance,
        relation: &str,
        field: &str,
        kind: FieldKind,
    ) -> Result<Option<FieldValue>> {
        let Some(related) = self.store.related_one(ctx, instance, relation)? else {
            return Ok(None);
        };

        if self.registry.has_column(&related.type_name, field) {
            let raw = self.registry.read(&related, field).unwrap_or_default();
            return Ok(format_value(kind, raw));
        }

        if kind == FieldKind::Attachment {
            if let Some(file) = self.store.file(ctx, &related, field)? {
                if file.exists() {
                    return Ok(Some(FieldValue::File(file.file)));
                }
            }
        }

        Ok(None)
    }

    fn list_value(
        &self,
        ctx: &ReadContext,
        instance: &Instance,
        relation: &str,
        field: &str,
        kind: FieldKind,
    ) -> Result<Option<FieldValue>> {
        let mut values = Vec::new();

        for item in self.store.related_many(ctx, instance, relation)? {
            let value = match self.registry.read(&item, field) {
                Some(raw) => format_value(kind, raw),
                None if kind == FieldKind::Attachment => match self.store.file(ctx, &item, field)? {
                    Some(file) if file.exists() => {
                        Some(FieldValue::Encoded(BASE64.encode(file.read()?)))
                    }
                    _ => None,
                },
                None => None,
            };
            values.extend(value);
        }

        Ok((!values.is_empty()).then_some(FieldValue::List(values)))
    }
}

impl std::fmt::Debug for DocumentSynthesizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSynthesizer")
            .field("published_field", &self.config.published_field)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
