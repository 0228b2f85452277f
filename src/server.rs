use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use log::{debug, error, info};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::customers::Customer;
use crate::error::GridError;
use crate::fields::Record;
use crate::handler::translate_and_execute;
use crate::request::{DataTablesRequest, DataTablesResponse};
use crate::source::{DataSource, SqliteSource};

/// Shared application state passed to all Axum handlers via `.with_state()`.
pub struct AppState<S> {
    pub customers: S,
    pub max_page_length: u64,
}

/// Column metadata derived from a record's field registry
#[derive(Debug, Serialize, PartialEq)]
pub struct ColumnMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub col_type: String,
    pub searchable: bool,
    pub orderable: bool,
}

pub struct WebServer {
    host: String,
    port: u16,
}

impl WebServer {
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }

    pub async fn start(
        &self,
        customers: SqliteSource<Customer>,
        max_page_length: u64,
    ) -> Result<(), GridError> {
        let app = create_router(Arc::new(AppState {
            customers,
            max_page_length,
        }));

        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| GridError::Error(format!("Invalid address: {}", e)))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GridError::Error(format!("Failed to bind to {}: {}", addr, e)))?;

        info!("Server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| GridError::Error(format!("Server error: {}", e)))?;

        info!("Server shutdown complete");
        Ok(())
    }
}

pub fn create_router<S>(state: Arc<AppState<S>>) -> Router
where
    S: DataSource<Row = Customer> + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/api/customers/data", post(customers_data::<S>))
        .route("/api/customers/columns", get(customers_columns))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

/// POST /api/customers/data
/// DataTables server-side processing endpoint for the customers table
async fn customers_data<S>(
    State(state): State<Arc<AppState<S>>>,
    Json(mut req): Json<DataTablesRequest>,
) -> Result<Json<DataTablesResponse<Customer>>, (StatusCode, String)>
where
    S: DataSource<Row = Customer> + 'static,
{
    req.clamp_length(state.max_page_length);
    debug!(
        "draw {}: start={} length={} search={:?} order={:?}",
        req.draw, req.start, req.length, req.search.value, req.order
    );

    match translate_and_execute(&req, &state.customers).await {
        Ok(resp) => Ok(Json(resp)),
        Err(e) => {
            let error_msg = e.to_string();
            error!("Customer data request failed: {}", error_msg);
            Err((StatusCode::INTERNAL_SERVER_ERROR, error_msg))
        }
    }
}

/// GET /api/customers/columns
/// Returns the searchable and orderable columns of the customers table
async fn customers_columns() -> Json<Vec<ColumnMetadata>> {
    Json(column_metadata::<Customer>())
}

pub fn column_metadata<T: Record>() -> Vec<ColumnMetadata> {
    T::field_entries()
        .map(|(name, spec)| ColumnMetadata {
            name: name.to_string(),
            col_type: spec.field_type.to_string(),
            searchable: spec.field_type.supports_contains(),
            // FieldValue::compare orders every field type
            orderable: true,
        })
        .collect()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        return;
    }
    info!("Shutdown signal received, stopping server");
}
