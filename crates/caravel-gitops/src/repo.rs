//! The Git configuration facade contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type alias for gitops operations.
pub type GitopsResult<T> = Result<T, GitopsError>;

/// Errors from the configuration repository.
#[derive(Debug, Error)]
pub enum GitopsError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("git upstream failure: {0}")]
    Upstream(String),
}

/// Environment values held in the cluster's configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvValue {
    /// Kubernetes namespace the cluster deploys into.
    pub namespace: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub region: String,
}

/// Where a cluster's configuration repository lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoInfo {
    pub repo_url: String,
    /// Helm value files, in merge order.
    pub value_files: Vec<String>,
}

/// Access to one application's cluster configuration repositories.
///
/// Implementations are the source of truth for merge semantics; in
/// particular the facade does not guarantee that re-invoking
/// `merge_branch` for the same pipeline run is idempotent.
#[async_trait]
pub trait GitopsRepo: Send + Sync {
    /// Write the build pipeline output into the cluster's
    /// configuration tree on the gitops branch. Returns the commit id.
    async fn update_pipeline_output(
        &self,
        application: &str,
        cluster: &str,
        chart: &str,
        output: &Value,
    ) -> GitopsResult<String>;

    /// Merge the cluster's gitops branch into the stable branch.
    /// Returns the resulting stable-branch revision.
    async fn merge_branch(
        &self,
        application: &str,
        cluster: &str,
        pipelinerun_id: u64,
    ) -> GitopsResult<String>;

    /// Read the environment values for the cluster.
    async fn get_env_value(
        &self,
        application: &str,
        cluster: &str,
        chart: &str,
    ) -> GitopsResult<EnvValue>;

    /// Repository location and value files for the cluster.
    async fn get_repo_info(&self, application: &str, cluster: &str) -> GitopsResult<RepoInfo>;
}
