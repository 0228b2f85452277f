//! Server-side processing for DataTables grids.
//!
//! A [`DataTablesRequest`] is translated into a lazy [`Query`] over a
//! [`DataSource`] in two stages: the global search becomes an OR of
//! "contains" predicates and the order criteria become sort keys. The
//! handler then runs the total count, filtered count and page fetch and
//! assembles a [`DataTablesResponse`].

pub mod cli;
pub mod config;
pub mod customers;
pub mod database;
pub mod error;
pub mod fields;
pub mod handler;
pub mod query;
pub mod request;
pub mod server;
pub mod source;

pub use error::{Diagnostic, GridError, TranslateError};
pub use fields::{FieldSpec, FieldType, FieldValue, Record};
pub use handler::translate_and_execute;
pub use query::{apply_order, apply_search, Query, Translation};
pub use request::{DataTablesRequest, DataTablesResponse};
pub use source::{DataSource, MemorySource, SqliteSource};
