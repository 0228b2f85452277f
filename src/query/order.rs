use crate::error::{Diagnostic, TranslateError};
use crate::fields::Record;
use crate::request::{DataTablesRequest, Order};
use crate::source::DataSource;

use super::{Query, SortKey, Translation};

fn resolve_sort_key<T: Record>(
    request: &DataTablesRequest,
    order: &Order,
) -> Result<SortKey<T>, TranslateError> {
    let column = usize::try_from(order.column)
        .ok()
        .and_then(|index| request.columns.get(index))
        .ok_or(TranslateError::ColumnIndexOutOfRange {
            index: order.column,
            count: request.columns.len(),
        })?;

    let (name, field) = T::fields()
        .get_entry(column.field_name())
        .ok_or_else(|| TranslateError::UnknownField {
            column: column.field_name().to_owned(),
            record: T::NAME,
        })?;

    Ok(SortKey {
        column: *name,
        field,
        direction: order.dir,
    })
}

/// Orders `query` by the request's order criteria: the first criterion is
/// the primary key and each later one breaks ties left by those before it.
///
/// Unlike search, a criterion that cannot be resolved keeps the keys already
/// applied: a shorter key list still gives a valid order. Criteria after the
/// failing one are skipped and a single diagnostic is returned.
pub fn apply_order<'s, S: DataSource>(
    query: Query<'s, S>,
    request: &DataTablesRequest,
) -> Translation<Query<'s, S>> {
    let mut query = query;

    for (index, order) in request.order.iter().enumerate() {
        let key = match resolve_sort_key::<S::Row>(request, order) {
            Ok(key) => key,
            Err(error) => {
                let context = format!("    at order, criterion {index}");
                return Translation::with_diagnostic(query, Diagnostic::new(error, context));
            }
        };

        query = match index {
            0 => query.order_by(key),
            _ => query.then_by(key),
        };
    }

    Translation::clean(query)
}
