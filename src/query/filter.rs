use log::debug;

use crate::error::{Diagnostic, TranslateError};
use crate::fields::{FieldSpec, Record};
use crate::request::DataTablesRequest;
use crate::source::DataSource;

use super::{Predicate, Query, Translation};

/// Resolves a searchable column to a field that supports containment.
fn resolve_search_field<T: Record>(
    column: &str,
) -> Result<(&'static str, &'static FieldSpec<T>), TranslateError> {
    let (name, field) = T::fields()
        .get_entry(column)
        .ok_or_else(|| TranslateError::UnknownField {
            column: column.to_owned(),
            record: T::NAME,
        })?;

    if !field.field_type.supports_contains() {
        return Err(TranslateError::UnsupportedOperator {
            column: column.to_owned(),
            field_type: field.field_type.to_string(),
            operator: "contains",
        });
    }

    Ok((*name, field))
}

/// Applies the request's global search to `query`.
///
/// Each searchable column contributes one "field contains value" term and
/// the terms are ORed together. A blank search value leaves the query alone.
///
/// If any searchable column cannot be resolved, the whole filter is dropped
/// and the original query is returned with a single diagnostic: a partial
/// filter would return a misleadingly "complete" answer. Columns after the
/// failing one are not looked at.
pub fn apply_search<'s, S: DataSource>(
    query: Query<'s, S>,
    request: &DataTablesRequest,
) -> Translation<Query<'s, S>> {
    let Some(value) = request.search.term() else {
        return Translation::clean(query);
    };

    let mut terms: Vec<Predicate<S::Row>> = Vec::new();

    for (index, column) in request.columns.iter().enumerate() {
        if !column.searchable {
            continue;
        }

        match resolve_search_field::<S::Row>(column.field_name()) {
            Ok((name, field)) => terms.push(Predicate::Contains {
                column: name,
                field,
                needle: value.to_owned(),
            }),
            Err(error) => {
                let context = format!("    at search, column {index}");
                return Translation::with_diagnostic(query, Diagnostic::new(error, context));
            }
        }
    }

    if terms.is_empty() {
        debug!("Search value present but no searchable columns");
        return Translation::clean(query);
    }

    Translation::clean(query.filter(Predicate::Any(terms)))
}
