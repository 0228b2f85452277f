use log::{debug, warn};

use crate::error::{render_diagnostics, GridError};
use crate::query::{apply_order, apply_search};
use crate::request::{DataTablesRequest, DataTablesResponse};
use crate::source::DataSource;

/// Translates a DataTables request into queries against `source`, runs
/// them, and assembles one page of results.
///
/// The total count, filtered count and page fetch are independent reads and
/// are awaited together. Problems with the request itself (unknown columns,
/// bad order indexes) never fail the call: they are reported in the
/// response's `error` field. Only failures of the source propagate.
pub async fn translate_and_execute<S: DataSource>(
    request: &DataTablesRequest,
    source: &S,
) -> Result<DataTablesResponse<S::Row>, GridError> {
    let total = source.query();

    let filtered = apply_search(total.clone(), request);
    let ordered = apply_order(filtered.query.clone(), request);

    let mut paged = ordered.query.skip(request.offset());
    if let Some(limit) = request.limit() {
        paged = paged.take(limit);
    }

    let mut diagnostics = filtered.diagnostics;
    diagnostics.extend(ordered.diagnostics);
    for diagnostic in &diagnostics {
        warn!(
            "draw {}: {}: {} ({})",
            request.draw,
            diagnostic.error.kind(),
            diagnostic.error,
            diagnostic.context.trim()
        );
    }

    let filtered = filtered.query;
    let (records_total, records_filtered, data) =
        tokio::try_join!(total.count(), filtered.count(), paged.fetch())?;

    debug!(
        "draw {}: total={} filtered={} returned={}",
        request.draw,
        records_total,
        records_filtered,
        data.len()
    );

    Ok(DataTablesResponse {
        draw: request.draw,
        records_total,
        // Separate reads may observe different snapshots of a live table
        records_filtered: records_filtered.min(records_total),
        data,
        error: render_diagnostics(&diagnostics),
    })
}
