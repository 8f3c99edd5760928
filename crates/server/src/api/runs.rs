//! Run API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use reelsmith_core::{
    ApprovalAction, OrchestratorError, RunFilter, RunRecord, RunStatus, StartRunRequest,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::state::AppState;

/// Maximum allowed limit for run queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for run queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing runs
#[derive(Debug, Deserialize)]
pub struct ListRunsParams {
    /// Filter by status, e.g. `PENDING_APPROVAL`
    pub status: Option<String>,
    /// Maximum number of runs to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Request body for reviewing a run
#[derive(Debug, Deserialize)]
pub struct ApproveRunBody {
    pub action: ApprovalAction,
}

/// Response for a started run
#[derive(Debug, Serialize)]
pub struct StartRunResponse {
    pub run_id: String,
    pub status: String,
}

/// Response for listing runs
#[derive(Debug, Serialize)]
pub struct ListRunsResponse {
    pub runs: Vec<RunRecord>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

impl From<OrchestratorError> for ErrorResponse {
    fn from(err: OrchestratorError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

fn orchestrator_error(err: OrchestratorError) -> ApiError {
    let status = match &err {
        OrchestratorError::Validation(_) => StatusCode::BAD_REQUEST,
        OrchestratorError::NotFound(_) => StatusCode::NOT_FOUND,
        OrchestratorError::InvalidState { .. } => StatusCode::CONFLICT,
        OrchestratorError::Store(e) => {
            error!("Run store error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::from(err)))
}

// ============================================================================
// Handlers
// ============================================================================

/// Start a run, or resume the latest failed run for the same topic
pub async fn start_run(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StartRunRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StartRunResponse>), ApiError> {
    let Json(request) =
        payload.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;

    let run_id = state
        .orchestrator()
        .start(request)
        .await
        .map_err(orchestrator_error)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(StartRunResponse {
            run_id,
            status: "started".to_string(),
        }),
    ))
}

/// Get a run by ID
pub async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RunRecord>, ApiError> {
    match state.orchestrator().get(&id) {
        Ok(Some(run)) => Ok(Json(run)),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, format!("run not found: {}", id))),
        Err(e) => Err(orchestrator_error(e)),
    }
}

/// List runs, newest first
pub async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListRunsParams>,
) -> Result<Json<ListRunsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = RunFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref status) = params.status {
        let status: RunStatus = status
            .parse()
            .map_err(|e: String| api_error(StatusCode::BAD_REQUEST, e))?;
        filter = filter.with_status(status);
    }

    let orchestrator = state.orchestrator();
    let runs = orchestrator.list(&filter).map_err(orchestrator_error)?;
    let total = orchestrator.count(&filter).map_err(orchestrator_error)?;

    Ok(Json(ListRunsResponse {
        runs,
        total,
        limit,
        offset,
    }))
}

/// Approve or reject a run waiting for review
pub async fn approve_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ApproveRunBody>, JsonRejection>,
) -> Result<Json<RunRecord>, ApiError> {
    let Json(body) = payload.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;

    state
        .orchestrator()
        .approve(&id, body.action)
        .await
        .map(Json)
        .map_err(orchestrator_error)
}

/// Delete a run record (artifacts stay on disk)
pub async fn delete_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .orchestrator()
        .delete(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(orchestrator_error)
}
