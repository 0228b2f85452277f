use std::fmt;

use crate::fields::{FieldSpec, Record};
use crate::request::SortDirection;

/// A boolean test over one record, kept as data so each backend can
/// interpret it (evaluate in memory, or render as SQL).
pub enum Predicate<T: 'static> {
    /// Field value contains `needle`, using the backend's native containment.
    Contains {
        column: &'static str,
        field: &'static FieldSpec<T>,
        needle: String,
    },
    /// Logical OR of the inner predicates. Empty matches nothing.
    Any(Vec<Predicate<T>>),
}

impl<T: Record> Predicate<T> {
    pub fn matches(&self, record: &T) -> bool {
        match self {
            Predicate::Contains { field, needle, .. } => field.get(record).contains(needle),
            Predicate::Any(terms) => terms.iter().any(|p| p.matches(record)),
        }
    }
}

impl<T: 'static> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        match self {
            Predicate::Contains {
                column,
                field,
                needle,
            } => Predicate::Contains {
                column: *column,
                field: *field,
                needle: needle.clone(),
            },
            Predicate::Any(terms) => Predicate::Any(terms.clone()),
        }
    }
}

impl<T: 'static> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Contains { column, needle, .. } => {
                write!(f, "{column} CONTAINS {needle:?}")
            }
            Predicate::Any(terms) => f.debug_tuple("Any").field(terms).finish(),
        }
    }
}

pub struct SortKey<T: 'static> {
    pub column: &'static str,
    pub field: &'static FieldSpec<T>,
    pub direction: SortDirection,
}

impl<T: 'static> Clone for SortKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for SortKey<T> {}

impl<T: 'static> fmt::Debug for SortKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.column, self.direction)
    }
}

/// The composed, not yet executed description of a query.
///
/// Filters are ANDed. Sort keys apply in order, each breaking ties left by
/// the previous ones. The window (`offset`, `limit`) always applies last.
pub struct QueryPlan<T: 'static> {
    pub filters: Vec<Predicate<T>>,
    pub sort: Vec<SortKey<T>>,
    pub offset: u64,
    pub limit: Option<u64>,
}

impl<T: 'static> QueryPlan<T> {
    pub fn new() -> Self {
        QueryPlan {
            filters: Vec::new(),
            sort: Vec::new(),
            offset: 0,
            limit: None,
        }
    }

    pub fn is_windowed(&self) -> bool {
        self.offset > 0 || self.limit.is_some()
    }
}

impl<T: 'static> Default for QueryPlan<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Clone for QueryPlan<T> {
    fn clone(&self) -> Self {
        QueryPlan {
            filters: self.filters.clone(),
            sort: self.sort.clone(),
            offset: self.offset,
            limit: self.limit,
        }
    }
}

impl<T: 'static> fmt::Debug for QueryPlan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryPlan")
            .field("filters", &self.filters)
            .field("sort", &self.sort)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .finish()
    }
}
