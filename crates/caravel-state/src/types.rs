//! Domain types for the Caravel state store.
//!
//! These types represent the persisted records the deployment pipeline
//! coordinates: pipeline runs (one deploy attempt each), clusters,
//! applications, template releases, and regions. All types are
//! serializable to/from JSON for storage in redb tables.

use serde::{Deserialize, Serialize};

/// Unique identifier for a pipeline run.
pub type PipelineRunId = u64;

/// Unique identifier for a cluster.
pub type ClusterId = u64;

/// Unique identifier for an application.
pub type ApplicationId = u64;

// ── Pipeline run ──────────────────────────────────────────────────

/// One deployment attempt's persisted record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub id: PipelineRunId,
    pub cluster_id: ClusterId,
    pub action: PipelineAction,
    pub status: PipelineStatus,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Git url this run builds from; empty unless action is build-deploy.
    #[serde(default)]
    pub git_url: String,
    #[serde(default)]
    pub git_branch: String,
    #[serde(default)]
    pub git_commit: String,
    /// Image url this run deploys.
    #[serde(default)]
    pub image_url: String,
    /// Config commit on the stable branch before this run.
    #[serde(default)]
    pub last_config_commit: String,
    /// Config commit this run wrote to the gitops branch.
    #[serde(default)]
    pub config_commit: String,
    /// Unix timestamp (seconds) when this run started.
    pub started_at: Option<u64>,
    /// Unix timestamp (seconds) when this run finished.
    pub finished_at: Option<u64>,
    pub created_by: UserInfo,
}

/// Who created a pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: u64,
    pub user_name: String,
}

/// What a pipeline run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineAction {
    BuildDeploy,
    Deploy,
    Restart,
    Rollback,
}

/// Lifecycle status of a pipeline run.
///
/// Forward progress within one attempt is
/// `Created -> Committed -> Merged -> Ok`. `Failed` and `Cancelled`
/// are reachable from any non-terminal state; `Unknown` is a transient
/// read state. Terminal states accept no further writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Created,
    Committed,
    Merged,
    Ok,
    Failed,
    Cancelled,
    Unknown,
}

impl PipelineStatus {
    /// Terminal statuses never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ok | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Committed => "committed",
            Self::Merged => "merged",
            Self::Ok => "ok",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// ── Cluster ───────────────────────────────────────────────────────

/// A target environment entity: one deployable cluster of an
/// application in a region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRecord {
    pub id: ClusterId,
    pub application_id: ApplicationId,
    pub name: String,
    pub environment: String,
    pub region: String,
    pub template: String,
    pub template_release: String,
    pub status: ClusterStatus,
    /// Unix timestamp (seconds) when this record was last updated.
    pub updated_at: u64,
}

/// Lifecycle status of a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStatus {
    /// No special lifecycle state; the cluster is active.
    Empty,
    /// Cluster resources are being reclaimed.
    Freeing,
    /// Cluster resources were reclaimed; must be reset before redeploy.
    Freed,
    Creating,
}

// ── Application ───────────────────────────────────────────────────

/// An application owning one or more clusters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

// ── Template release ──────────────────────────────────────────────

/// A released version of a deploy template, bound to a Helm chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRelease {
    pub template: String,
    pub release: String,
    pub chart_name: String,
    #[serde(default)]
    pub recommended: bool,
}

impl TemplateRelease {
    /// Build the composite key for the template_releases table.
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.template, self.release)
    }
}

// ── Region ────────────────────────────────────────────────────────

pub use caravel_core::RegionEntity;
