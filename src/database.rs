use std::path::Path;

use log::{debug, info};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};

use crate::customers::{demo_customers, Customer, CREATE_CUSTOMERS_SQL};
use crate::error::GridError;

const SCHEMA_VERSION: &str = "1";

const CREATE_META_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);"#;

pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Opens (creating if needed) the database at `db_path` and makes sure
    /// the schema is current.
    pub fn open(db_path: &Path) -> Result<Self, GridError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder().build(manager)?;

        info!("Database opened at: {}", db_path.display());

        let db = Database { pool };
        db.ensure_schema()?;

        Ok(db)
    }

    pub fn pool(&self) -> Pool<SqliteConnectionManager> {
        self.pool.clone()
    }

    fn ensure_schema(&self) -> Result<(), GridError> {
        let conn = self.pool.get()?;

        let table_exists: bool = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='meta'",
                [],
                |row| row.get::<_, i32>(0),
            )
            .map(|count| count > 0)?;

        if !table_exists {
            return Self::create_schema(&conn);
        }

        let stored_version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored_version.as_deref() {
            Some(SCHEMA_VERSION) => Ok(()),
            Some(other) => Err(GridError::Error(format!(
                "Schema version mismatch: found {other}, expected {SCHEMA_VERSION}"
            ))),
            None => Err(GridError::Error("Schema version missing".to_string())),
        }
    }

    fn create_schema(conn: &Connection) -> Result<(), GridError> {
        debug!("Creating schema version {SCHEMA_VERSION}");
        conn.execute_batch(CREATE_META_SQL)?;
        conn.execute_batch(CREATE_CUSTOMERS_SQL)?;
        conn.execute(
            "INSERT INTO meta (key, value) VALUES ('schema_version', ?)",
            [SCHEMA_VERSION],
        )?;
        Ok(())
    }

    /// Replaces the contents of the customers table with `count` demo rows.
    pub fn seed_customers(&self, count: usize) -> Result<usize, GridError> {
        let inserted = self.replace_customers(&demo_customers(count))?;
        info!("Seeded {inserted} customers");
        Ok(inserted)
    }

    /// Replaces the contents of the customers table with `customers`, in order.
    pub fn replace_customers(&self, customers: &[Customer]) -> Result<usize, GridError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM customers", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO customers (customer_id, first_name, last_name, email, city, state, signup_date, active)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )?;
            for c in customers {
                stmt.execute(params![
                    c.customer_id,
                    c.first_name,
                    c.last_name,
                    c.email,
                    c.city,
                    c.state,
                    c.signup_date,
                    c.active
                ])?;
            }
        }
        tx.commit()?;

        debug!("Replaced customers table with {} rows", customers.len());
        Ok(customers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn customer_count(db: &Database) -> i64 {
        db.pool
            .get()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_open_creates_schema() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("nested").join("grid.db")).unwrap();
        assert_eq!(customer_count(&db), 0);
    }

    #[test]
    fn test_reopen_checks_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grid.db");
        Database::open(&path).unwrap();
        assert!(Database::open(&path).is_ok());
    }

    #[test]
    fn test_version_mismatch_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grid.db");
        let db = Database::open(&path).unwrap();
        db.pool
            .get()
            .unwrap()
            .execute("UPDATE meta SET value = '99' WHERE key = 'schema_version'", [])
            .unwrap();
        drop(db);

        let err = Database::open(&path).err().unwrap();
        assert!(err.to_string().contains("Schema version mismatch"));
    }

    #[test]
    fn test_seed_replaces_rows() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("grid.db")).unwrap();
        db.seed_customers(25).unwrap();
        assert_eq!(customer_count(&db), 25);
        db.seed_customers(10).unwrap();
        assert_eq!(customer_count(&db), 10);
    }

    #[test]
    fn test_replace_customers_keeps_given_rows() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("grid.db")).unwrap();
        let mut rows = demo_customers(3);
        rows[1].city = "Houston".into();

        assert_eq!(db.replace_customers(&rows).unwrap(), 3);
        let city: String = db
            .pool
            .get()
            .unwrap()
            .query_row("SELECT city FROM customers WHERE customer_id = 2", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(city, "Houston");
    }
}
