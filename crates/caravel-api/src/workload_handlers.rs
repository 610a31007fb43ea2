//! REST API handlers for workload queries.
//!
//! Callers post a workload reference; the CD facade resolves the
//! matching ability and answers from live cluster state.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use caravel_cd::CdError;
use caravel_core::WorkloadRef;
use caravel_workload::WorkloadError;

use crate::ApiState;

/// Response wrapper for workload endpoints.
#[derive(serde::Serialize)]
struct WorkloadResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> WorkloadResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn workload_error(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(WorkloadResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn cd_status(err: &CdError) -> StatusCode {
    match err {
        CdError::UnsupportedKind(_) => StatusCode::BAD_REQUEST,
        CdError::NotFound(_) => StatusCode::NOT_FOUND,
        CdError::Workload(WorkloadError::NotFound(_)) => StatusCode::NOT_FOUND,
        CdError::Workload(WorkloadError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// POST /api/v1/workloads/steps
pub async fn get_steps(
    State(state): State<ApiState>,
    Json(node): Json<WorkloadRef>,
) -> impl IntoResponse {
    match state.cd.get_steps(&node).await {
        Ok(step) => WorkloadResponse::ok(step).into_response(),
        Err(e) => workload_error(&e.to_string(), cd_status(&e)).into_response(),
    }
}

/// POST /api/v1/workloads/health
pub async fn is_healthy(
    State(state): State<ApiState>,
    Json(node): Json<WorkloadRef>,
) -> impl IntoResponse {
    match state.cd.is_healthy(&node).await {
        Ok(healthy) => WorkloadResponse::ok(healthy).into_response(),
        Err(e) => workload_error(&e.to_string(), cd_status(&e)).into_response(),
    }
}

/// POST /api/v1/workloads/pods
pub async fn list_pods(
    State(state): State<ApiState>,
    Json(node): Json<WorkloadRef>,
) -> impl IntoResponse {
    match state.cd.list_pods(&node).await {
        Ok(pods) => WorkloadResponse::ok(pods).into_response(),
        Err(e) => workload_error(&e.to_string(), cd_status(&e)).into_response(),
    }
}

/// Request body to execute a workload action.
#[derive(serde::Deserialize)]
pub struct ActionRequest {
    pub workload: WorkloadRef,
    pub action: String,
}

/// POST /api/v1/workloads/action
///
/// Returns the mutated live object; persistence is the caller's job.
pub async fn exec_action(
    State(state): State<ApiState>,
    Json(req): Json<ActionRequest>,
) -> impl IntoResponse {
    match state.cd.exec_action(&req.workload, &req.action).await {
        Ok(mutated) => WorkloadResponse::ok(mutated).into_response(),
        Err(e) => workload_error(&e.to_string(), cd_status(&e)).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use caravel_cd::{CdFacade, RecordingCd};
    use caravel_gitops::InMemoryGitops;
    use caravel_pipeline::Deployer;
    use caravel_state::StateStore;
    use caravel_workload::rollout::{ROLLOUT_GROUP, ROLLOUT_KIND, RolloutAbility, gvr_rollout};
    use caravel_workload::{AbilityRegistry, InMemoryCluster};
    use serde_json::json;

    fn test_state(cluster: &InMemoryCluster) -> ApiState {
        let store = StateStore::open_in_memory().unwrap();
        let backend = Arc::new(RecordingCd::new());
        let mut registry = AbilityRegistry::new();
        registry.register(Arc::new(RolloutAbility), vec![gvr_rollout("v1alpha1")]);
        ApiState {
            store: store.clone(),
            deployer: Arc::new(Deployer::new(
                store,
                Arc::new(InMemoryGitops::new()),
                backend.clone(),
            )),
            cd: Arc::new(CdFacade::new(
                cluster.client(),
                Arc::new(registry),
                backend,
            )),
        }
    }

    fn rollout_ref() -> WorkloadRef {
        WorkloadRef {
            namespace: "prod".to_string(),
            name: "web".to_string(),
            group: ROLLOUT_GROUP.to_string(),
            version: "v1alpha1".to_string(),
            kind: ROLLOUT_KIND.to_string(),
        }
    }

    #[tokio::test]
    async fn steps_for_live_rollout() {
        let cluster = InMemoryCluster::new();
        cluster
            .insert(
                &gvr_rollout("v1alpha1"),
                "prod",
                "web",
                json!({
                    "spec": {
                        "replicas": 4,
                        "strategy": {"canary": {"steps": [
                            {"setWeight": 50}, {"setWeight": 100}
                        ]}},
                    },
                    "status": {},
                }),
            )
            .await;
        let state = test_state(&cluster);

        let resp = get_steps(State(state), Json(rollout_ref()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn steps_for_missing_rollout_is_404() {
        let cluster = InMemoryCluster::new();
        let state = test_state(&cluster);
        let resp = get_steps(State(state), Json(rollout_ref()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unsupported_kind_is_400() {
        let cluster = InMemoryCluster::new();
        let state = test_state(&cluster);
        let node = WorkloadRef {
            group: "apps".to_string(),
            kind: "StatefulSet".to_string(),
            ..rollout_ref()
        };
        let resp = is_healthy(State(state), Json(node)).await.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn action_mutates_and_returns_object() {
        let cluster = InMemoryCluster::new();
        cluster
            .insert(
                &gvr_rollout("v1alpha1"),
                "prod",
                "web",
                json!({"spec": {"replicas": 2}, "status": {}}),
            )
            .await;
        let state = test_state(&cluster);

        let resp = exec_action(
            State(state),
            Json(ActionRequest {
                workload: rollout_ref(),
                action: "pause".to_string(),
            }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_action_is_400() {
        let cluster = InMemoryCluster::new();
        cluster
            .insert(
                &gvr_rollout("v1alpha1"),
                "prod",
                "web",
                json!({"spec": {}, "status": {}}),
            )
            .await;
        let state = test_state(&cluster);

        let resp = exec_action(
            State(state),
            Json(ActionRequest {
                workload: rollout_ref(),
                action: "explode".to_string(),
            }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
