pub mod filter;
pub mod order;
mod plan;

pub use filter::apply_search;
pub use order::apply_order;
pub use plan::{Predicate, QueryPlan, SortKey};

use crate::error::{Diagnostic, GridError};
use crate::source::DataSource;

/// A lazily composed query over a [`DataSource`].
///
/// Every builder method only edits the plan. Nothing touches the backend
/// until [`Query::count`] or [`Query::fetch`] is awaited.
pub struct Query<'s, S: DataSource> {
    source: &'s S,
    plan: QueryPlan<S::Row>,
}

impl<'s, S: DataSource> Query<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Query {
            source,
            plan: QueryPlan::new(),
        }
    }

    pub fn plan(&self) -> &QueryPlan<S::Row> {
        &self.plan
    }

    pub fn filter(mut self, predicate: Predicate<S::Row>) -> Self {
        self.plan.filters.push(predicate);
        self
    }

    /// Replaces any existing ordering with `key` as the primary sort key.
    pub fn order_by(mut self, key: SortKey<S::Row>) -> Self {
        self.plan.sort.clear();
        self.plan.sort.push(key);
        self
    }

    /// Adds a tie-break key after all keys applied so far.
    pub fn then_by(mut self, key: SortKey<S::Row>) -> Self {
        self.plan.sort.push(key);
        self
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.plan.offset = self.plan.offset.saturating_add(n);
        self.plan.limit = self.plan.limit.map(|l| l.saturating_sub(n));
        self
    }

    pub fn take(mut self, n: u64) -> Self {
        self.plan.limit = Some(self.plan.limit.map_or(n, |l| l.min(n)));
        self
    }

    pub async fn count(&self) -> Result<u64, GridError> {
        self.source.count(&self.plan).await
    }

    pub async fn fetch(&self) -> Result<Vec<S::Row>, GridError> {
        self.source.fetch(&self.plan).await
    }
}

impl<S: DataSource> Clone for Query<'_, S> {
    fn clone(&self) -> Self {
        Query {
            source: self.source,
            plan: self.plan.clone(),
        }
    }
}

/// A built query plus the recoverable problems found while building it.
#[derive(Debug)]
pub struct Translation<Q> {
    pub query: Q,
    pub diagnostics: Vec<Diagnostic>,
}

impl<Q> Translation<Q> {
    pub fn clean(query: Q) -> Self {
        Translation {
            query,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostic(query: Q, diagnostic: Diagnostic) -> Self {
        Translation {
            query,
            diagnostics: vec![diagnostic],
        }
    }
}

impl<S: DataSource> std::fmt::Debug for Query<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query").field("plan", &self.plan).finish()
    }
}
