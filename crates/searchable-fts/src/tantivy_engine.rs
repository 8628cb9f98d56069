//! Tantivy search engine implementation.
//!
//! Provides `TantivyEngine`, which keeps one on-disk Tantivy index per content
//! type under the configured root:
//!
//! ```text
//! <index_path>/
//!   Article/
//!     schema.json   # field specs the index was created from
//!     index/        # Tantivy index directory
//! ```
//!
//! Defining a type whose stored field specs differ from the requested ones
//! recreates its index. Documents are keyed by a reserved `doc_id` field;
//! `index` deletes any previous version before adding. This module is only
//! available with the `fts-tantivy` feature.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;
use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, INDEXED, STORED, STRING,
};
use tantivy::tokenizer::{Language, LowerCaser, SimpleTokenizer, Stemmer, TextAnalyzer};
use tantivy::{Index, IndexWriter, TantivyDocument, Term};

use searchable_core::{Error, FieldKind, InstanceId, Result};

use crate::document::{FieldValue, SearchDocument};
use crate::engine::SearchEngine;
use crate::synthesizer::DATE_FORMAT;
use crate::types::IndexSchema;

/// Reserved field holding the instance id.
pub const ID_FIELD: &str = "doc_id";

/// Stemming tokenizer name.
pub const STEM_TOKENIZER: &str = "en_stem";

const SCHEMA_FILE: &str = "schema.json";
const INDEX_DIR: &str = "index";

/// Index writer buffer size (20MB).
const WRITER_BUFFER_SIZE: usize = 20_000_000;

struct TypeIndex {
    schema: IndexSchema,
    index: Index,
    writer: IndexWriter,
    id: Field,
    fields: BTreeMap<String, (Field, FieldKind)>,
}

/// Tantivy-backed search engine.
pub struct TantivyEngine {
    root: PathBuf,
    indexes: Mutex<BTreeMap<String, TypeIndex>>,
}

impl TantivyEngine {
    /// Create an engine rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| Error::io_with_path(e, &root))?;
        Ok(Self {
            root,
            indexes: Mutex::new(BTreeMap::new()),
        })
    }

    /// Root directory of all type indexes.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of committed, live documents of a type.
    pub fn document_count(&self, type_name: &str) -> Result<u64> {
        let mut indexes = self.indexes();
        let Some(entry) = self.ensure_open(&mut indexes, type_name)? else {
            return Ok(0);
        };
        let reader = entry
            .index
            .reader()
            .map_err(|e| Error::engine(format!("Failed to open reader: {e}")))?;
        Ok(reader.searcher().num_docs())
    }

    fn indexes(&self) -> MutexGuard<'_, BTreeMap<String, TypeIndex>> {
        self.indexes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn type_dir(&self, type_name: &str) -> PathBuf {
        self.root.join(type_name)
    }

    /// Field specs an on-disk index was created from, if any.
    fn stored_schema(&self, type_name: &str) -> Result<Option<IndexSchema>> {
        let dir = self.type_dir(type_name);
        let path = dir.join(SCHEMA_FILE);
        if !path.is_file() || !dir.join(INDEX_DIR).join("meta.json").is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Open the on-disk index of a type that was defined by an earlier run.
    fn ensure_open<'m>(
        &self,
        indexes: &'m mut BTreeMap<String, TypeIndex>,
        type_name: &str,
    ) -> Result<Option<&'m mut TypeIndex>> {
        if !indexes.contains_key(type_name) {
            let Some(schema) = self.stored_schema(type_name)? else {
                return Ok(None);
            };
            let entry = self.open(schema)?;
            indexes.insert(type_name.to_string(), entry);
        }
        Ok(indexes.get_mut(type_name))
    }

    fn open(&self, schema: IndexSchema) -> Result<TypeIndex> {
        let index_dir = self.type_dir(&schema.type_name).join(INDEX_DIR);
        let index = Index::open_in_dir(&index_dir)
            .map_err(|e| Error::engine(format!("Failed to open index: {e}")))?;
        let (_, id, fields) = build_schema(&schema);
        TypeIndex::new(schema, index, id, fields)
    }

    fn create(&self, schema: IndexSchema) -> Result<TypeIndex> {
        let dir = self.type_dir(&schema.type_name);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| Error::io_with_path(e, &dir))?;
        }
        let index_dir = dir.join(INDEX_DIR);
        std::fs::create_dir_all(&index_dir).map_err(|e| Error::io_with_path(e, &index_dir))?;

        let (tantivy_schema, id, fields) = build_schema(&schema);
        let index = Index::create_in_dir(&index_dir, tantivy_schema)
            .map_err(|e| Error::engine(format!("Failed to create index: {e}")))?;

        let schema_path = dir.join(SCHEMA_FILE);
        std::fs::write(&schema_path, serde_json::to_string_pretty(&schema)?)
            .map_err(|e| Error::io_with_path(e, &schema_path))?;

        TypeIndex::new(schema, index, id, fields)
    }
}

impl TypeIndex {
    fn new(
        schema: IndexSchema,
        index: Index,
        id: Field,
        fields: BTreeMap<String, (Field, FieldKind)>,
    ) -> Result<Self> {
        register_tokenizers(&index);
        let writer = index
            .writer_with_num_threads(1, WRITER_BUFFER_SIZE)
            .map_err(|e| Error::engine(format!("Failed to create index writer: {e}")))?;
        Ok(Self {
            schema,
            index,
            writer,
            id,
            fields,
        })
    }

    fn id_term(&self, id: InstanceId) -> Term {
        Term::from_field_text(self.id, &id.to_string())
    }

    fn convert(&self, document: &SearchDocument) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        doc.add_text(self.id, document.id.to_string());

        for (name, value) in &document.fields {
            let Some((field, kind)) = self.fields.get(name) else {
                log::debug!("{}.{name}: not in the defined mapping, skipped", document.type_name);
                continue;
            };
            add_value(&mut doc, *field, *kind, value);
        }
        doc
    }
}

impl SearchEngine for TantivyEngine {
    fn define(&self, schema: &IndexSchema) -> Result<()> {
        let mut indexes = self.indexes();
        let type_name = schema.type_name.as_str();

        if indexes.get(type_name).is_some_and(|entry| entry.schema == *schema) {
            return Ok(());
        }
        // Drop the open writer first so its directory lock is released.
        indexes.remove(type_name);

        let entry = if self.stored_schema(type_name)?.as_ref() == Some(schema) {
            log::debug!("Reusing index for {type_name}");
            self.open(schema.clone())?
        } else {
            log::info!("Creating index for {type_name} ({} fields)", schema.len());
            self.create(schema.clone())?
        };
        indexes.insert(type_name.to_string(), entry);
        Ok(())
    }

    fn index(&self, document: &SearchDocument) -> Result<()> {
        let mut indexes = self.indexes();
        let entry = self
            .ensure_open(&mut indexes, &document.type_name)?
            .ok_or_else(|| {
                Error::engine(format!("No index defined for {}", document.type_name))
            })?;

        let doc = entry.convert(document);
        entry.writer.delete_term(entry.id_term(document.id));
        entry
            .writer
            .add_document(doc)
            .map_err(|e| Error::engine(format!("Failed to add document: {e}")))?;
        Ok(())
    }

    fn remove(&self, type_name: &str, id: InstanceId) -> Result<()> {
        let mut indexes = self.indexes();
        if let Some(entry) = self.ensure_open(&mut indexes, type_name)? {
            entry.writer.delete_term(entry.id_term(id));
        }
        Ok(())
    }

    fn refresh(&self) -> Result<()> {
        let mut indexes = self.indexes();
        for (type_name, entry) in indexes.iter_mut() {
            entry
                .writer
                .commit()
                .map_err(|e| Error::engine(format!("Failed to commit {type_name}: {e}")))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "tantivy"
    }
}

impl std::fmt::Debug for TantivyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TantivyEngine")
            .field("root", &self.root)
            .field("open", &self.indexes().keys().cloned().collect::<Vec<_>>())
            .finish()
    }
}

/// Register custom tokenizers with a Tantivy index.
pub fn register_tokenizers(index: &Index) {
    let en_stem = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(Stemmer::new(Language::English))
        .build();

    index.tokenizers().register(STEM_TOKENIZER, en_stem);
}

/// Tokenizer for an analyzer hint. Stemming analyzers map to `en_stem`;
/// Tantivy's own tokenizer names pass through.
fn tokenizer_for(analyzer: Option<&str>) -> &str {
    match analyzer {
        None => "default",
        Some(name @ ("default" | "raw" | "whitespace" | STEM_TOKENIZER)) => name,
        Some("snowball" | "english" | "stemmed") => STEM_TOKENIZER,
        Some(other) => {
            log::debug!("Unknown analyzer '{other}', using default tokenizer");
            "default"
        }
    }
}

/// Translate field specs to a Tantivy schema. Field ids follow declaration
/// order, so the same specs always produce the same fields.
fn build_schema(schema: &IndexSchema) -> (Schema, Field, BTreeMap<String, (Field, FieldKind)>) {
    let mut builder = Schema::builder();
    let id = builder.add_text_field(ID_FIELD, STRING | STORED);
    let mut fields = BTreeMap::new();

    for spec in &schema.fields {
        if spec.name == ID_FIELD {
            log::debug!("{}.{ID_FIELD}: reserved field name, skipped", schema.type_name);
            continue;
        }
        let name = spec.name.as_str();
        let field = match spec.kind {
            FieldKind::Boolean => builder.add_bool_field(name, INDEXED | STORED),
            FieldKind::Integer => builder.add_i64_field(name, INDEXED | STORED),
            FieldKind::Float | FieldKind::Double => builder.add_f64_field(name, INDEXED | STORED),
            FieldKind::Date => builder.add_date_field(name, INDEXED | STORED),
            FieldKind::Text => {
                let options = TextOptions::default()
                    .set_indexing_options(
                        TextFieldIndexing::default()
                            .set_tokenizer(tokenizer_for(spec.analyzer.as_deref()))
                            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
                    )
                    .set_stored();
                builder.add_text_field(name, options)
            }
            FieldKind::Attachment => builder.add_text_field(name, STORED),
        };
        fields.insert(spec.name.clone(), (field, spec.kind));
    }

    (builder.build(), id, fields)
}

fn add_value(doc: &mut TantivyDocument, field: Field, kind: FieldKind, value: &FieldValue) {
    if let FieldValue::List(items) = value {
        for item in items {
            add_value(doc, field, kind, item);
        }
        return;
    }

    match (kind, value) {
        (FieldKind::Boolean, FieldValue::Bool(b)) => doc.add_bool(field, *b),
        (FieldKind::Boolean, FieldValue::Int(i)) => doc.add_bool(field, *i != 0),
        (FieldKind::Integer, FieldValue::Int(i)) => doc.add_i64(field, *i),
        (FieldKind::Integer, FieldValue::Bool(b)) => doc.add_i64(field, i64::from(*b)),
        (FieldKind::Integer, FieldValue::Text(s)) => match s.trim().parse::<i64>() {
            Ok(i) => doc.add_i64(field, i),
            Err(_) => log::debug!("'{s}' is not an integer, skipped"),
        },
        (FieldKind::Float | FieldKind::Double, FieldValue::Float(f)) => doc.add_f64(field, *f),
        (FieldKind::Float | FieldKind::Double, FieldValue::Int(i)) => doc.add_f64(field, *i as f64),
        (FieldKind::Float | FieldKind::Double, FieldValue::Text(s)) => {
            match s.trim().parse::<f64>() {
                Ok(f) => doc.add_f64(field, f),
                Err(_) => log::debug!("'{s}' is not a number, skipped"),
            }
        }
        (FieldKind::Date, FieldValue::Date(s) | FieldValue::Text(s)) => {
            match NaiveDateTime::parse_from_str(s, DATE_FORMAT) {
                Ok(dt) => doc.add_date(
                    field,
                    tantivy::DateTime::from_timestamp_secs(dt.and_utc().timestamp()),
                ),
                Err(_) => log::debug!("'{s}' is not a normalized date, skipped"),
            }
        }
        (FieldKind::Text | FieldKind::Attachment, value) => doc.add_text(field, value.to_text()),
        (kind, value) => log::debug!("{value:?} does not fit a {kind} field, skipped"),
    }
}

// ============================================================================
// Tests
// ============================================================================
