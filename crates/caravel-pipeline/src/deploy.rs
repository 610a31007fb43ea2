//! The deployment state machine.
//!
//! One invocation drives one pipeline run forward:
//! `Created -> Committed -> Merged -> Ok`. Every status advancement is
//! persisted immediately, so a crash or failure leaves the run's
//! status at the last stage whose external effect actually happened.
//! The machine never writes `Failed`; marking a run failed or
//! cancelled is the caller's decision.
//!
//! Not safe to invoke concurrently for the same run or the same
//! cluster; the caller imposes per-cluster mutual exclusion.

use std::sync::Arc;

use caravel_cd::{CdBackend, CreateClusterParams, DeployClusterParams};
use caravel_gitops::GitopsRepo;
use caravel_state::{
    ClusterId, ClusterStatus, PipelineRunId, PipelineStatus, StateStore,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};

/// What a successful deploy invocation hands back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    pub pipelinerun_id: PipelineRunId,
    /// Config commit this run wrote to the gitops branch.
    pub commit: String,
}

/// Drives one pipeline run through the deploy stages.
pub struct Deployer {
    store: StateStore,
    gitops: Arc<dyn GitopsRepo>,
    cd: Arc<dyn CdBackend>,
}

impl Deployer {
    pub fn new(store: StateStore, gitops: Arc<dyn GitopsRepo>, cd: Arc<dyn CdBackend>) -> Self {
        Self { store, gitops, cd }
    }

    /// Run one deploy attempt for `pipelinerun_id` against
    /// `cluster_id`, writing `output` into the cluster's configuration
    /// tree.
    ///
    /// Fails with [`PipelineError::NotFound`] before touching any
    /// external system when the run is missing or belongs to another
    /// cluster. On any stage failure the wrapped error is returned and
    /// the run keeps the status of the last completed stage; a retry
    /// re-enters from the top.
    pub async fn deploy(
        &self,
        cluster_id: ClusterId,
        pipelinerun_id: PipelineRunId,
        output: &Value,
    ) -> PipelineResult<DeployResponse> {
        // Load the run and validate ownership.
        let run = self
            .store
            .get_pipeline_run(pipelinerun_id)?
            .filter(|run| run.cluster_id == cluster_id)
            .ok_or_else(|| {
                PipelineError::NotFound(format!("pipeline run {pipelinerun_id}"))
            })?;

        // Relevant records: cluster, application, template release.
        let mut cluster = self
            .store
            .get_cluster(cluster_id)?
            .ok_or_else(|| PipelineError::NotFound(format!("cluster {cluster_id}")))?;
        let application = self
            .store
            .get_application(cluster.application_id)?
            .ok_or_else(|| {
                PipelineError::NotFound(format!("application {}", cluster.application_id))
            })?;
        let release = self
            .store
            .get_template_release(&cluster.template, &cluster.template_release)?
            .ok_or_else(|| {
                PipelineError::NotFound(format!(
                    "template release {}/{}",
                    cluster.template, cluster.template_release
                ))
            })?;

        // Write the pipeline output into the configuration tree.
        info!(pipelinerun_id, cluster = %cluster.name, "writing pipeline output");
        let commit = self
            .gitops
            .update_pipeline_output(&application.name, &cluster.name, &release.chart_name, output)
            .await?;

        self.store.update_config_commit(run.id, &commit)?;
        self.advance(run.id, PipelineStatus::Committed, &commit)?;

        // Merge the working branch into the stable branch.
        let revision = self
            .gitops
            .merge_branch(&application.name, &cluster.name, run.id)
            .await?;
        self.advance(run.id, PipelineStatus::Merged, &revision)?;

        // Realize the cluster in the CD system.
        let region = self
            .store
            .get_region(&cluster.region)?
            .ok_or_else(|| PipelineError::NotFound(format!("region {}", cluster.region)))?;
        let env_value = self
            .gitops
            .get_env_value(&application.name, &cluster.name, &release.chart_name)
            .await?;
        let repo_info = self
            .gitops
            .get_repo_info(&application.name, &cluster.name)
            .await?;
        self.cd
            .create_cluster(&CreateClusterParams {
                environment: cluster.environment.clone(),
                cluster: cluster.name.clone(),
                git_repo_url: repo_info.repo_url,
                value_files: repo_info.value_files,
                region_entity: region,
                namespace: env_value.namespace,
            })
            .await?;

        // A reclaimed cluster must be marked active again before
        // traffic is sent to it.
        if cluster.status == ClusterStatus::Freed {
            cluster.status = ClusterStatus::Empty;
            cluster = self.store.update_cluster(&cluster)?;
        }

        self.cd
            .deploy_cluster(&DeployClusterParams {
                environment: cluster.environment.clone(),
                cluster: cluster.name.clone(),
                revision: revision.clone(),
            })
            .await?;

        self.advance(run.id, PipelineStatus::Ok, &revision)?;

        Ok(DeployResponse {
            pipelinerun_id: run.id,
            commit,
        })
    }

    fn advance(
        &self,
        id: PipelineRunId,
        status: PipelineStatus,
        revision: &str,
    ) -> PipelineResult<()> {
        self.store.update_pipeline_status(id, status)?;
        info!(pipelinerun_id = id, %status, revision, "pipeline run advanced");
        Ok(())
    }
}
