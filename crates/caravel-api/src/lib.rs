//! caravel-api — REST API for Caravel.
//!
//! Provides axum route handlers for triggering deploys and querying
//! workload health and progress.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/api/v1/clusters/:cluster_id/pipelineruns/:id/deploy` | Run the deploy pipeline |
//! | GET | `/api/v1/pipelineruns/:id` | Get a pipeline run |
//! | POST | `/api/v1/workloads/steps` | Rollout progress for a workload |
//! | POST | `/api/v1/workloads/health` | Health verdict for a workload |
//! | POST | `/api/v1/workloads/pods` | Pods owned by a workload |
//! | POST | `/api/v1/workloads/action` | Execute a named workload action |

pub mod handlers;
pub mod workload_handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use caravel_cd::CdFacade;
use caravel_pipeline::Deployer;
use caravel_state::StateStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
    pub deployer: Arc<Deployer>,
    pub cd: Arc<CdFacade>,
}

/// Build the complete API router.
pub fn build_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route(
            "/clusters/{cluster_id}/pipelineruns/{id}/deploy",
            post(handlers::deploy),
        )
        .route("/pipelineruns/{id}", get(handlers::get_pipeline_run))
        .route("/workloads/steps", post(workload_handlers::get_steps))
        .route("/workloads/health", post(workload_handlers::is_healthy))
        .route("/workloads/pods", post(workload_handlers::list_pods))
        .route("/workloads/action", post(workload_handlers::exec_action))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}
