use rusqlite::Error as RusqliteError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] RusqliteError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] Box<figment::Error>),

    #[error("Error: {0}")]
    Error(String),
}

/// A recoverable problem found while translating a request into a query.
///
/// These never abort a request. They are collected as [`Diagnostic`]s and
/// reported to the client in the response's `error` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("Column '{column}' does not name a field of {record}")]
    UnknownField {
        column: String,
        record: &'static str,
    },

    #[error("Field '{column}' of type {field_type} does not support {operator}")]
    UnsupportedOperator {
        column: String,
        field_type: String,
        operator: &'static str,
    },

    #[error("Order column index {index} is out of range ({count} columns)")]
    ColumnIndexOutOfRange { index: i64, count: usize },
}

impl TranslateError {
    pub fn kind(&self) -> &'static str {
        match self {
            TranslateError::UnknownField { .. } => "UnknownField",
            TranslateError::UnsupportedOperator { .. } => "UnsupportedOperator",
            TranslateError::ColumnIndexOutOfRange { .. } => "ColumnIndexOutOfRange",
        }
    }
}

/// A [`TranslateError`] together with where in the request it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub error: TranslateError,
    pub context: String,
}

impl Diagnostic {
    pub fn new(error: TranslateError, context: impl Into<String>) -> Self {
        Diagnostic {
            error,
            context: context.into(),
        }
    }

    /// Renders as `Kind: message` followed by the context on its own line.
    pub fn render(&self) -> String {
        format!("{}: {}\n{}", self.error.kind(), self.error, self.context)
    }
}

/// Joins rendered diagnostics into the text sent back in `error`.
pub fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(Diagnostic::render)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_unknown_field() {
        let diag = Diagnostic::new(
            TranslateError::UnknownField {
                column: "nope".into(),
                record: "Customer",
            },
            "    at search, column 2",
        );
        assert_eq!(
            diag.render(),
            "UnknownField: Column 'nope' does not name a field of Customer\n    at search, column 2"
        );
    }

    #[test]
    fn test_render_diagnostics_joins_lines() {
        let a = Diagnostic::new(
            TranslateError::ColumnIndexOutOfRange { index: 5, count: 1 },
            "    at order, criterion 0",
        );
        let b = Diagnostic::new(
            TranslateError::UnsupportedOperator {
                column: "active".into(),
                field_type: "Bool".into(),
                operator: "contains",
            },
            "    at search, column 0",
        );
        let text = render_diagnostics(&[a, b]);
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("ColumnIndexOutOfRange: "));
        assert!(text.contains("UnsupportedOperator: Field 'active' of type Bool does not support contains"));
    }

    #[test]
    fn test_render_diagnostics_empty() {
        assert_eq!(render_diagnostics(&[]), "");
    }
}
