use std::marker::PhantomData;

use log::{debug, Level};
use logging_timer::timer;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Row};

use crate::error::GridError;
use crate::fields::Record;
use crate::query::{Predicate, QueryPlan};
use crate::request::SortDirection;

use super::DataSource;

/// A record stored one-per-row in a SQLite table whose column names are the
/// `name_db` of each registered field. The table must be a rowid table:
/// rowid order is the natural order of the source.
pub trait SqlRecord: Record {
    const TABLE: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Executes plans as SQL against a pooled SQLite database.
///
/// Each read runs on the blocking thread pool with its own pooled connection,
/// so the count and fetch reads of one request can run side by side.
pub struct SqliteSource<T> {
    pool: Pool<SqliteConnectionManager>,
    _row: PhantomData<fn() -> T>,
}

impl<T> Clone for SqliteSource<T> {
    fn clone(&self) -> Self {
        SqliteSource {
            pool: self.pool.clone(),
            _row: PhantomData,
        }
    }
}

impl<T: SqlRecord> SqliteSource<T> {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Self {
        SqliteSource {
            pool,
            _row: PhantomData,
        }
    }

    async fn run<R, F>(&self, f: F) -> Result<R, GridError>
    where
        R: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> Result<R, GridError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await?
    }
}

/// Escapes `%`, `_` and the escape character itself so `needle` matches
/// literally inside a `LIKE` pattern.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn push_predicate<T: 'static>(pred: &Predicate<T>, sql: &mut String, params: &mut Vec<Value>) {
    match pred {
        Predicate::Contains { field, needle, .. } => {
            sql.push_str(&format!("({} LIKE ? ESCAPE '\\')", field.name_db));
            params.push(Value::Text(like_pattern(needle)));
        }
        Predicate::Any(terms) if terms.is_empty() => sql.push_str("(0)"),
        Predicate::Any(terms) => {
            let mut first = true;
            sql.push('(');
            for term in terms {
                match first {
                    true => first = false,
                    false => sql.push_str(" OR "),
                }
                push_predicate(term, sql, params);
            }
            sql.push(')');
        }
    }
}

/// Renders the filters as a `WHERE` clause with positional parameters.
pub(crate) fn to_where_clause<T: 'static>(plan: &QueryPlan<T>) -> (String, Vec<Value>) {
    let mut sql = String::new();
    let mut params = Vec::new();

    let mut first = true;
    for pred in &plan.filters {
        match first {
            true => {
                first = false;
                sql.push_str("\nWHERE ");
            }
            false => sql.push_str(" AND "),
        }
        push_predicate(pred, &mut sql, &mut params);
    }

    (sql, params)
}

/// Renders the sort keys as an `ORDER BY` clause. Rows tied on every key are
/// ordered by rowid so ties keep natural order, as they do in memory.
pub(crate) fn to_order_clause<T: 'static>(plan: &QueryPlan<T>) -> String {
    if plan.sort.is_empty() {
        return String::new();
    }

    let mut order_clause = String::from("\nORDER BY ");
    for key in &plan.sort {
        order_clause.push_str(key.field.name_db);
        order_clause.push_str(match key.direction {
            SortDirection::Asc => " ASC, ",
            SortDirection::Desc => " DESC, ",
        });
    }
    order_clause.push_str("rowid ASC");

    order_clause
}

/// `LIMIT ? OFFSET ?`; SQLite needs a LIMIT before OFFSET, so "no limit" is -1.
pub(crate) fn to_window_clause<T: 'static>(plan: &QueryPlan<T>, params: &mut Vec<Value>) -> String {
    if !plan.is_windowed() {
        return String::new();
    }
    let limit = plan
        .limit
        .map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let offset = i64::try_from(plan.offset).unwrap_or(i64::MAX);
    params.push(Value::Integer(limit));
    params.push(Value::Integer(offset));
    "\nLIMIT ? OFFSET ?".to_string()
}

pub(crate) fn select_sql<T: SqlRecord>(plan: &QueryPlan<T>) -> (String, Vec<Value>) {
    let columns: Vec<&str> = T::fields().values().map(|f| f.name_db).collect();
    let (where_clause, mut params) = to_where_clause(plan);

    let mut sql = format!("SELECT {}\nFROM {}", columns.join(", "), T::TABLE);
    sql.push_str(&where_clause);
    sql.push_str(&to_order_clause(plan));
    sql.push_str(&to_window_clause(plan, &mut params));

    (sql, params)
}

pub(crate) fn count_sql<T: SqlRecord>(plan: &QueryPlan<T>) -> (String, Vec<Value>) {
    let (where_clause, mut params) = to_where_clause(plan);

    if plan.is_windowed() {
        // Counting a window means counting the rows the window would return
        let window = to_window_clause(plan, &mut params);
        let sql = format!(
            "SELECT COUNT(*) FROM (SELECT 1 FROM {}{}{})",
            T::TABLE,
            where_clause,
            window
        );
        (sql, params)
    } else {
        (
            format!("SELECT COUNT(*) FROM {}{}", T::TABLE, where_clause),
            params,
        )
    }
}

impl<T: SqlRecord> DataSource for SqliteSource<T> {
    type Row = T;

    async fn count(&self, plan: &QueryPlan<T>) -> Result<u64, GridError> {
        let (sql, params) = count_sql(plan);
        debug!("Count query: {sql} {params:?}");

        self.run(move |conn| {
            let _tmr = timer!(Level::Trace; "SqliteSource::count");
            let count: i64 =
                conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn fetch(&self, plan: &QueryPlan<T>) -> Result<Vec<T>, GridError> {
        let (sql, params) = select_sql(plan);
        debug!("Fetch query: {sql} {params:?}");

        self.run(move |conn| {
            let _tmr = timer!(Level::Trace; "SqliteSource::fetch");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), |row| T::from_row(row))?
                .collect::<Result<Vec<T>, _>>()?;
            Ok(rows)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customers::Customer;
    use crate::database::Database;
    use crate::query::SortKey;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn contains(column: &'static str, needle: &str) -> Predicate<Customer> {
        Predicate::Contains {
            column,
            field: Customer::field(column).unwrap(),
            needle: needle.to_owned(),
        }
    }

    fn key(column: &'static str, direction: SortDirection) -> SortKey<Customer> {
        SortKey {
            column,
            field: Customer::field(column).unwrap(),
            direction,
        }
    }

    fn seeded_source(count: usize) -> (TempDir, SqliteSource<Customer>) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("test.db")).unwrap();
        db.seed_customers(count).unwrap();
        (dir, SqliteSource::new(db.pool()))
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Aus"), "%Aus%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn test_where_clause_or_terms() {
        let mut plan: QueryPlan<Customer> = QueryPlan::new();
        plan.filters.push(Predicate::Any(vec![
            contains("first_name", "an"),
            contains("city", "an"),
        ]));
        let (sql, params) = to_where_clause(&plan);
        assert_eq!(
            sql,
            "\nWHERE ((first_name LIKE ? ESCAPE '\\') OR (city LIKE ? ESCAPE '\\'))"
        );
        assert_eq!(
            params,
            vec![Value::Text("%an%".into()), Value::Text("%an%".into())]
        );
    }

    #[test]
    fn test_order_clause() {
        let mut plan: QueryPlan<Customer> = QueryPlan::new();
        assert_eq!(to_order_clause(&plan), "");
        plan.sort.push(key("state", SortDirection::Desc));
        plan.sort.push(key("last_name", SortDirection::Asc));
        assert_eq!(
            to_order_clause(&plan),
            "\nORDER BY state DESC, last_name ASC, rowid ASC"
        );
    }

    #[test]
    fn test_select_sql_with_window() {
        let mut plan: QueryPlan<Customer> = QueryPlan::new();
        plan.offset = 20;
        let (sql, params) = select_sql(&plan);
        assert!(sql.starts_with("SELECT customer_id, first_name, last_name, email"));
        assert!(sql.ends_with("FROM customers\nLIMIT ? OFFSET ?"));
        assert_eq!(params, vec![Value::Integer(-1), Value::Integer(20)]);
    }

    #[test]
    fn test_count_sql_unwindowed() {
        let plan: QueryPlan<Customer> = QueryPlan::new();
        let (sql, params) = count_sql(&plan);
        assert_eq!(sql, "SELECT COUNT(*) FROM customers");
        assert!(params.is_empty());
    }

    #[tokio::test]
    async fn test_count_and_fetch_against_database() {
        let (_dir, source) = seeded_source(40);
        assert_eq!(source.query().count().await.unwrap(), 40);

        let austin = source
            .query()
            .filter(Predicate::Any(vec![contains("city", "Austin")]));
        assert_eq!(austin.count().await.unwrap(), 4);

        let rows = austin
            .clone()
            .order_by(key("customer_id", SortDirection::Desc))
            .take(2)
            .fetch()
            .await
            .unwrap();
        let ids: Vec<i64> = rows.iter().map(|c| c.customer_id).collect();
        assert_eq!(ids, vec![31, 21]);
    }

    #[tokio::test]
    async fn test_wildcards_match_literally() {
        let (_dir, source) = seeded_source(10);
        let query = source
            .query()
            .filter(Predicate::Any(vec![contains("first_name", "_")]));
        assert_eq!(query.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rows_round_trip_from_database() {
        let (_dir, source) = seeded_source(8);
        let rows = source.query().fetch().await.unwrap();
        assert_eq!(rows, crate::customers::demo_customers(8));
    }

    #[tokio::test]
    async fn test_windowed_count() {
        let (_dir, source) = seeded_source(10);
        assert_eq!(source.query().skip(7).take(5).count().await.unwrap(), 3);
    }
}
