//! HTTP service.
//!
//! Routes:
//! - `POST /scan` - ingest a batch, see [`handlers::scan`]
//! - `POST /query` - findings by severity, see [`handlers::query`]
//! - `GET /health`

mod error;
pub mod handlers;
mod types;

pub use error::ApiError;
pub use types::{ErrorBody, HealthResponse, QueryFilters, QueryRequest, ScanRequest};

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::ingest::IngestEngine;
use crate::store::ScanStore;

/// Shared handler state. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: Arc<IngestEngine>,
    pub store: ScanStore,
}

impl AppState {
    #[must_use]
    pub fn new(engine: IngestEngine, store: ScanStore) -> Self {
        Self {
            engine: Arc::new(engine),
            store,
        }
    }
}

/// Builds the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/scan", post(handlers::scan))
        .route("/query", post(handlers::query))
        .route("/health", get(handlers::health))
        .with_state(state)
}
