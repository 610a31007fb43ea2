//! REST API handlers for pipeline runs.
//!
//! Each handler reads/writes via the state store or the deployer and
//! returns JSON responses.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;
use tracing::error;

use caravel_pipeline::PipelineError;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn pipeline_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::State(caravel_state::StateError::NotFound(_)) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// POST /api/v1/clusters/:cluster_id/pipelineruns/:id/deploy
///
/// Body is the raw pipeline output written into the cluster's
/// configuration tree.
pub async fn deploy(
    State(state): State<ApiState>,
    Path((cluster_id, id)): Path<(u64, u64)>,
    Json(output): Json<Value>,
) -> impl IntoResponse {
    match state.deployer.deploy(cluster_id, id, &output).await {
        Ok(response) => ApiResponse::ok(response).into_response(),
        Err(e) => {
            let status = pipeline_status(&e);
            if status.is_server_error() {
                error!(cluster_id, pipelinerun_id = id, error = %e, "deploy failed");
            }
            error_response(&e.to_string(), status).into_response()
        }
    }
}

/// GET /api/v1/pipelineruns/:id
pub async fn get_pipeline_run(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    match state.store.get_pipeline_run(id) {
        Ok(Some(run)) => ApiResponse::ok(run).into_response(),
        Ok(None) => error_response("pipeline run not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}
