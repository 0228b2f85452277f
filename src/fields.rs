use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use phf::ordered_map::Entries;
use strum::{AsRefStr, Display};

/// Per-record-type map from column name to field spec. Built at compile time
/// with `phf_ordered_map!` so lookup never reflects over the record.
pub type FieldMap<T> = phf::OrderedMap<&'static str, FieldSpec<T>>;

/// Reads one field out of a record.
pub type Getter<T> = for<'r> fn(&'r T) -> FieldValue<'r>;

#[derive(AsRefStr, Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Text,
    Date,
    Bool,
}

impl FieldType {
    /// Whether a global search may test this field with string containment.
    pub fn supports_contains(&self) -> bool {
        matches!(self, FieldType::Text)
    }
}

/// A borrowed view of a single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Null,
    Int(i64),
    Text(&'a str),
    Date(NaiveDate),
    Bool(bool),
}

impl FieldValue<'_> {
    fn rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Int(_) => 1,
            FieldValue::Bool(_) => 2,
            FieldValue::Date(_) => 3,
            FieldValue::Text(_) => 4,
        }
    }

    /// Total order used for sorting. Nulls come first, matching SQLite's
    /// ascending order; text compares bytewise like the BINARY collation.
    pub fn compare(&self, other: &FieldValue<'_>) -> Ordering {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// String containment. Non-text values never match.
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            FieldValue::Text(s) => s.contains(needle),
            _ => false,
        }
    }
}

pub struct FieldSpec<T: 'static> {
    pub name_db: &'static str,
    pub field_type: FieldType,
    pub getter: Getter<T>,
}

impl<T: 'static> FieldSpec<T> {
    pub const fn new(name_db: &'static str, field_type: FieldType, getter: Getter<T>) -> Self {
        FieldSpec {
            name_db,
            field_type,
            getter,
        }
    }

    pub fn get<'r>(&self, record: &'r T) -> FieldValue<'r> {
        (self.getter)(record)
    }
}

impl<T: 'static> fmt::Debug for FieldSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name_db", &self.name_db)
            .field("field_type", &self.field_type)
            .finish_non_exhaustive()
    }
}

/// A row type that can be searched and sorted by column name.
pub trait Record: Send + Sync + Sized + 'static {
    /// Name used in diagnostics.
    const NAME: &'static str;

    fn fields() -> &'static FieldMap<Self>;

    fn field(column: &str) -> Option<&'static FieldSpec<Self>> {
        Self::fields().get(column)
    }

    fn field_entries() -> Entries<'static, &'static str, FieldSpec<Self>> {
        Self::fields().entries()
    }
}
