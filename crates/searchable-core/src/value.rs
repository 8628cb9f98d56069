//! Field values read from content instances.
//!
//! A [`Value`] is whatever a column or accessor yields. Values are loosely
//! typed on purpose: the search-side field kind decides how they are
//! formatted, not the value itself.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A raw value read from a content instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// No value stored.
    #[default]
    Null,
    /// Boolean column.
    Bool(bool),
    /// Integer column.
    Int(i64),
    /// Floating point column.
    Float(f64),
    /// Any textual column (varchar, html, enum, datetime strings).
    Text(String),
    /// A file-like object.
    File(FileRef),
}

impl Value {
    /// Whether the value counts as set.
    ///
    /// Null, `false`, zero, the empty string and `"0"` are falsy, mirroring how
    /// content stores treat unset columns.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Text(s) => !s.is_empty() && s != "0",
            Value::File(_) => true,
        }
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the file reference, if this is a file value.
    pub fn as_file(&self) -> Option<&FileRef> {
        match self {
            Value::File(f) => Some(f),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Reference to a file-like object's bytes on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Location of the file.
    pub file: PathBuf,
}

impl FileRef {
    /// Create a reference to the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { file: path.into() }
    }

    /// Path to the file's bytes.
    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Whether the file exists on storage.
    pub fn exists(&self) -> bool {
        self.file.is_file()
    }

    /// Read the file's bytes.
    pub fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.file).map_err(|e| Error::io_with_path(e, &self.file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(!Value::Text("0".into()).is_truthy());

        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(7).is_truthy());
        assert!(Value::Float(0.5).is_truthy());
        assert!(Value::from("2024-01-02").is_truthy());
    }

    #[test]
    fn test_untagged_deserialization() {
        let values: Vec<Value> =
            serde_json::from_str(r#"[null, true, 3, 1.5, "text", {"file": "a/b.pdf"}]"#).unwrap();
        assert_eq!(values[0], Value::Null);
        assert_eq!(values[1], Value::Bool(true));
        assert_eq!(values[2], Value::Int(3));
        assert_eq!(values[3], Value::Float(1.5));
        assert_eq!(values[4], Value::from("text"));
        assert_eq!(values[5], Value::File(FileRef::new("a/b.pdf")));
    }

    #[test]
    fn test_file_ref_exists_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"hello")
            .unwrap();

        let file = FileRef::new(&path);
        assert!(file.exists());
        assert_eq!(file.read().unwrap(), b"hello");

        let missing = FileRef::new(dir.path().join("missing.txt"));
        assert!(!missing.exists());
        assert!(matches!(missing.read(), Err(Error::Io { .. })));
    }
}
