//! The `Ability` contract and the cluster read surfaces it runs against.
//!
//! An ability is a stateless, per-workload-kind strategy: pure
//! functions of cluster state. It reads through a [`ClusterClient`],
//! which pairs a cached (informer-style) surface with a direct reader
//! for calls where accuracy matters more than latency.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use caravel_core::{GroupVersionResource, Step, WorkloadRef};

use crate::error::WorkloadResult;

/// Cached read surface backed by informer-style caches.
#[async_trait]
pub trait ObjectCache: Send + Sync {
    /// Get one object by namespace and name from the cache.
    async fn get(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        name: &str,
    ) -> WorkloadResult<Option<Value>>;

    /// List objects in a namespace whose labels contain every pair in
    /// `selector`.
    async fn list(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> WorkloadResult<Vec<Value>>;
}

/// Uncached read surface going straight to the API server.
#[async_trait]
pub trait DynamicReader: Send + Sync {
    async fn get(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        name: &str,
    ) -> WorkloadResult<Option<Value>>;
}

/// One cluster connection: the cached and direct read surfaces an
/// ability dispatches through.
#[derive(Clone)]
pub struct ClusterClient {
    pub cache: Arc<dyn ObjectCache>,
    pub dynamic: Arc<dyn DynamicReader>,
}

/// Per-workload-kind strategy for reading health and rollout progress.
///
/// Implementations are stateless and safe to call concurrently for
/// distinct workload references. `action` mutates a caller-supplied
/// in-memory object; the caller persists the result and must serialize
/// read-modify-write cycles against the same live object.
#[async_trait]
pub trait Ability: Send + Sync {
    /// Whether this ability understands the given group/kind. Exact
    /// string match, no wildcarding.
    fn matches_kind(&self, group: &str, kind: &str) -> bool;

    /// Whether the workload is fully rolled out and serving.
    ///
    /// An `Err` means the check could not be performed (read or
    /// convert failure) and must not be read as confirmed-unhealthy;
    /// only `Ok(false)` is a real health verdict.
    async fn is_healthy(&self, node: &WorkloadRef, client: &ClusterClient)
    -> WorkloadResult<bool>;

    /// Pods currently owned by the workload.
    async fn list_pods(
        &self,
        node: &WorkloadRef,
        client: &ClusterClient,
    ) -> WorkloadResult<Vec<Pod>>;

    /// Rollout progress reduced to the uniform step model.
    async fn get_steps(&self, node: &WorkloadRef, client: &ClusterClient) -> WorkloadResult<Step>;

    /// Apply a named action to an in-memory live object, returning the
    /// mutated object. The input is left untouched on failure.
    fn action(&self, name: &str, live: &Value) -> WorkloadResult<Value>;
}

/// Lite pod representation surfaced to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    pub name: String,
    pub namespace: String,
    pub phase: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Raw pod spec, kept opaque for hashing and display.
    #[serde(default)]
    pub spec: Value,
}

#[derive(Debug, Default, Deserialize)]
struct RawPod {
    #[serde(default)]
    metadata: RawMeta,
    #[serde(default)]
    spec: Value,
    #[serde(default)]
    status: RawPodStatus,
}

#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    annotations: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPodStatus {
    #[serde(default)]
    phase: String,
}

/// Convert raw cluster objects into pods, skipping anything that does
/// not parse as one.
pub fn pods_from_objects(objects: Vec<Value>) -> Vec<Pod> {
    objects
        .into_iter()
        .filter_map(|obj| serde_json::from_value::<RawPod>(obj).ok())
        .map(|raw| Pod {
            name: raw.metadata.name,
            namespace: raw.metadata.namespace,
            phase: raw.status.phase,
            labels: raw.metadata.labels,
            annotations: raw.metadata.annotations,
            spec: raw.spec,
        })
        .collect()
}
