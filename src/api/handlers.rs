//! Route handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::{debug, error, info, instrument};

use super::AppState;
use super::error::ApiError;
use super::types::{HealthResponse, QueryRequest, ScanRequest};
use crate::ingest::{Batch, IngestReport};
use crate::parser::Finding;
use crate::store::StoredFinding;

/// `POST /scan`: ingest a batch and return the per-item report.
///
/// Item failures are reported in the body with status 200; only a
/// malformed request is rejected.
#[instrument(skip_all)]
pub async fn scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<IngestReport>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection, "rejected scan request body");
        ApiError::invalid_body()
    })?;
    if request.repository.trim().is_empty() {
        return Err(ApiError::invalid_body());
    }

    info!(
        repository = %request.repository,
        items = request.items.len(),
        "scan requested"
    );
    let batch = Batch::new(request.repository, request.items);
    let report = state.engine.dispatch(&batch).await;
    Ok(Json(report))
}

/// `POST /query`: findings with an exact severity match.
#[instrument(skip_all)]
pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<Vec<Finding>>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection, "rejected query request body");
        ApiError::invalid_body()
    })?;

    let severity = request
        .filters
        .severity
        .filter(|severity| !severity.is_empty())
        .ok_or_else(|| ApiError::bad_request("Severity filter is required"))?;

    let rows = state
        .store
        .findings_by_severity(&severity)
        .await
        .map_err(|e| {
            error!(error = %e, severity = %severity, "query failed");
            ApiError::internal(format!("Query failed: {e}"))
        })?;

    debug!(severity = %severity, matches = rows.len(), "query complete");
    Ok(Json(rows.into_iter().map(StoredFinding::into_finding).collect()))
}

/// `GET /health`.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
