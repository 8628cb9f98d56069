//! Primitive data type → search field kind mapping.
//!
//! Content columns are declared with primitive data types such as
//! `Varchar(255)` or `SS_Datetime`. Parameters are stripped before lookup;
//! types without a mapping yield `None` and the column is not indexed.

use searchable_core::FieldKind;

/// Mapping table from primitive data type to search field kind.
pub const MAPPINGS: [(&str, FieldKind); 14] = [
    ("Boolean", FieldKind::Boolean),
    ("Decimal", FieldKind::Double),
    ("Double", FieldKind::Double),
    ("Enum", FieldKind::Text),
    ("Float", FieldKind::Float),
    ("HTMLText", FieldKind::Text),
    ("HTMLVarchar", FieldKind::Text),
    ("Int", FieldKind::Integer),
    ("SS_Datetime", FieldKind::Date),
    ("Text", FieldKind::Text),
    ("Varchar", FieldKind::Text),
    ("Year", FieldKind::Integer),
    ("File", FieldKind::Attachment),
    ("Date", FieldKind::Date),
];

/// Strip a parameter suffix: `"Varchar(255)"` → `"Varchar"`.
///
/// A string starting with `(` is returned unchanged.
pub fn strip_type_parameters(data_type: &str) -> &str {
    match data_type.find('(') {
        Some(pos) if pos > 0 => &data_type[..pos],
        _ => data_type,
    }
}

/// Map a primitive data type to its search field kind.
pub fn map_primitive_type(data_type: &str) -> Option<FieldKind> {
    let stripped = strip_type_parameters(data_type);
    MAPPINGS
        .iter()
        .find(|(name, _)| *name == stripped)
        .map(|(_, kind)| *kind)
}

// ============================================================================
// Tests
// ============================================================================
