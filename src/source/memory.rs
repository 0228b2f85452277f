use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::GridError;
use crate::fields::Record;
use crate::query::{QueryPlan, SortKey};
use crate::request::SortDirection;

use super::DataSource;

/// Rows held in memory. Plans are evaluated by walking the rows once for the
/// filter, then running a stable sort over the matches.
#[derive(Debug)]
pub struct MemorySource<T> {
    rows: Arc<Vec<T>>,
}

impl<T> Clone for MemorySource<T> {
    fn clone(&self) -> Self {
        MemorySource {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<T: Record + Clone> MemorySource<T> {
    pub fn new(rows: Vec<T>) -> Self {
        MemorySource {
            rows: Arc::new(rows),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn select<'r>(&'r self, plan: &QueryPlan<T>) -> Vec<&'r T> {
        let mut selected: Vec<&T> = self
            .rows
            .iter()
            .filter(|row| plan.filters.iter().all(|p| p.matches(row)))
            .collect();

        if !plan.sort.is_empty() {
            // slice::sort_by is stable, so rows tied on every key keep source order
            selected.sort_by(|a, b| compare_by_keys(&plan.sort, a, b));
        }

        let offset = usize::try_from(plan.offset).unwrap_or(usize::MAX);
        let limit = plan
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        selected.into_iter().skip(offset).take(limit).collect()
    }
}

fn compare_by_keys<T: Record>(keys: &[SortKey<T>], a: &T, b: &T) -> Ordering {
    for key in keys {
        let ord = key.field.get(a).compare(&key.field.get(b));
        let ord = match key.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

impl<T: Record + Clone> DataSource for MemorySource<T> {
    type Row = T;

    async fn count(&self, plan: &QueryPlan<T>) -> Result<u64, GridError> {
        let count = if plan.is_windowed() {
            self.select(plan).len()
        } else {
            self.rows
                .iter()
                .filter(|row| plan.filters.iter().all(|p| p.matches(row)))
                .count()
        };
        Ok(count as u64)
    }

    async fn fetch(&self, plan: &QueryPlan<T>) -> Result<Vec<T>, GridError> {
        Ok(self.select(plan).into_iter().cloned().collect())
    }
}
