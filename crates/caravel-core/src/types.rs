//! Shared types used across Caravel crates.
//!
//! These are the value types exchanged between the workload ability
//! layer, the CD facade, and the pipeline: references to live cluster
//! objects and the uniform progress snapshot every workload kind is
//! reduced to.

use serde::{Deserialize, Serialize};

/// A group/version/resource triple identifying one watchable API surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn new(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
        }
    }
}

impl std::fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.resource)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.resource)
        }
    }
}

/// Reference to one live Kubernetes object.
///
/// Supplied per query; never owned or mutated by the components that
/// consume it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadRef {
    pub namespace: String,
    pub name: String,
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl WorkloadRef {
    /// The GVR this reference resolves through, given the resource's
    /// plural name.
    pub fn gvr(&self, resource: &str) -> GroupVersionResource {
        GroupVersionResource::new(&self.group, &self.version, resource)
    }
}

/// Progress snapshot for a workload, uniform across workload kinds.
///
/// `replicas` holds the incremental replica target of each step, so
/// `replicas.len() == total` and `sum(replicas)` equals the final
/// cumulative target. `index` counts only steps that carry a replica
/// effect; pure pause/analysis steps never advance it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Current position, 0-based. `0 <= index <= total`.
    pub index: usize,
    /// Number of steps.
    pub total: usize,
    /// Incremental replica targets, one per step.
    pub replicas: Vec<i64>,
    /// Whether the workload is paused by an operator.
    #[serde(default)]
    pub manual_paused: bool,
    /// Whether the workload will promote without operator input.
    #[serde(default)]
    pub auto_promote: bool,
    /// Opaque forward-compatible payload (e.g. raw current-index blob).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

/// A deployment region: one target cluster the CD system can place
/// workloads into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionEntity {
    pub name: String,
    pub display_name: String,
    /// API server endpoint of the region's cluster.
    pub server: String,
}
