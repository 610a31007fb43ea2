//! CD backend contract and the recording test backend.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use caravel_core::RegionEntity;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CdError, CdResult};

/// Parameters for creating (or re-synchronizing) a CD application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterParams {
    pub environment: String,
    pub cluster: String,
    pub git_repo_url: String,
    pub value_files: Vec<String>,
    pub region_entity: RegionEntity,
    pub namespace: String,
}

/// Parameters for triggering a sync to a pinned revision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployClusterParams {
    pub environment: String,
    pub cluster: String,
    pub revision: String,
}

/// Continuous-delivery backend the pipeline hands clusters to.
///
/// `create_cluster` must be idempotent: re-creating an existing CD
/// application with the same parameters is a no-op, not an error.
#[async_trait]
pub trait CdBackend: Send + Sync {
    async fn create_cluster(&self, params: &CreateClusterParams) -> CdResult<()>;
    async fn deploy_cluster(&self, params: &DeployClusterParams) -> CdResult<()>;
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum CdCall {
    CreateCluster(CreateClusterParams),
    DeployCluster(DeployClusterParams),
}

impl CdCall {
    pub fn op(&self) -> &'static str {
        match self {
            Self::CreateCluster(_) => "create_cluster",
            Self::DeployCluster(_) => "deploy_cluster",
        }
    }
}

#[derive(Default)]
struct Recorded {
    calls: Vec<CdCall>,
    fail_op: Option<String>,
}

/// Backend that records calls instead of talking to a CD system.
///
/// Serves the standalone daemon and failure-path tests.
#[derive(Clone, Default)]
pub struct RecordingCd {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingCd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the named operation fail with an upstream error.
    pub fn fail_op(&self, op: &str) {
        self.inner.lock().unwrap().fail_op = Some(op.to_string());
    }

    pub fn calls(&self) -> Vec<CdCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    fn record(&self, call: CdCall) -> CdResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let should_fail = inner.fail_op.as_deref() == Some(call.op());
        debug!(op = call.op(), should_fail, "cd call");
        inner.calls.push(call);
        if should_fail {
            return Err(CdError::Upstream("primed to fail".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CdBackend for RecordingCd {
    async fn create_cluster(&self, params: &CreateClusterParams) -> CdResult<()> {
        self.record(CdCall::CreateCluster(params.clone()))
    }

    async fn deploy_cluster(&self, params: &DeployClusterParams) -> CdResult<()> {
        self.record(CdCall::DeployCluster(params.clone()))
    }
}
