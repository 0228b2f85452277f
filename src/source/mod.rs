//! The seam between the translator and whatever holds the rows.
//!
//! A [`DataSource`] executes a [`QueryPlan`]; the [`Query`] builder composes
//! plans without executing them. Two backends are provided:
//!
//! - [`MemorySource`]: rows held in a `Vec`, evaluated in process
//! - [`SqliteSource`]: rows in a SQLite table, plans rendered as SQL

mod memory;
mod sqlite;

pub use memory::MemorySource;
pub use sqlite::{SqlRecord, SqliteSource};

use std::future::Future;

use crate::error::GridError;
use crate::fields::Record;
use crate::query::{Query, QueryPlan};

pub trait DataSource: Send + Sync {
    type Row: Record;

    /// Number of rows the plan selects, honoring its window.
    fn count(
        &self,
        plan: &QueryPlan<Self::Row>,
    ) -> impl Future<Output = Result<u64, GridError>> + Send;

    /// Materializes the rows the plan selects, in plan order.
    fn fetch(
        &self,
        plan: &QueryPlan<Self::Row>,
    ) -> impl Future<Output = Result<Vec<Self::Row>, GridError>> + Send;

    /// An empty query over every row of this source.
    fn query(&self) -> Query<'_, Self>
    where
        Self: Sized,
    {
        Query::new(self)
    }
}
