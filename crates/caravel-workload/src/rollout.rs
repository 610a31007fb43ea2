//! Canary-rollout ability — health and step progress for
//! `argoproj.io/Rollout` workloads.
//!
//! A canary rollout advances replicas through a declared sequence of
//! steps. This ability reduces that to the uniform [`Step`] model:
//! weight steps become `ceil(weight/100 * replicas)` cumulative
//! targets, replica-count steps contribute their literal count, and
//! the cumulative sequence is converted to incremental targets. The
//! reported current-step index is only trusted when the stored hash of
//! the step list still matches the declared steps; a changed strategy
//! restarts progress accounting at zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use caravel_core::{GroupVersionResource, Step, WorkloadRef, canonical_hash};

use crate::ability::{Ability, ClusterClient, Pod, pods_from_objects};
use crate::error::{WorkloadError, WorkloadResult};

/// API group of the rollout CRD.
pub const ROLLOUT_GROUP: &str = "argoproj.io";
/// Resource kind of the rollout CRD.
pub const ROLLOUT_KIND: &str = "Rollout";

/// GVR of the rollout CRD at a given API version.
pub fn gvr_rollout(version: &str) -> GroupVersionResource {
    GroupVersionResource::new(ROLLOUT_GROUP, version, "rollouts")
}

/// GVR of core pods.
pub fn gvr_pod() -> GroupVersionResource {
    GroupVersionResource::new("", "v1", "pods")
}

// ── Typed manifest model ──────────────────────────────────────────
//
// The live object is parsed into these types instead of being mutated
// as an untyped key-value tree. Unknown fields are preserved through
// the flattened `rest` maps so actions round-trip foreign fields
// untouched.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloutManifest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<RolloutSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RolloutStatus>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloutSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i64>,
    #[serde(default)]
    pub paused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PodTemplate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<RolloutStrategy>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodTemplate {
    #[serde(default)]
    pub metadata: TemplateMeta,
    #[serde(default)]
    pub spec: Value,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateMeta {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolloutStrategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canary: Option<CanaryStrategy>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanaryStrategy {
    #[serde(default)]
    pub steps: Vec<CanaryStep>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanaryStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_weight: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_replica: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause: Option<Value>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

impl CanaryStep {
    /// Whether this step changes the replica count. Pure pause or
    /// analysis steps do not advance the externally visible index.
    pub fn has_replica_effect(&self) -> bool {
        self.set_weight.is_some() || self.set_replica.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloutStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_promote: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_conditions: Option<Value>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

/// Hash of a declared step list, as persisted by the backend when it
/// last observed the steps.
pub fn step_list_hash(steps: &[CanaryStep]) -> String {
    canonical_hash(&steps)
}

// ── Action patch ──────────────────────────────────────────────────

/// Typed optional-field patch describing exactly the fields an action
/// may touch.
#[derive(Debug, Clone, Default, PartialEq)]
struct RolloutPatch {
    paused: Option<bool>,
    clear_pause_conditions: bool,
    current_step_index: Option<i64>,
    auto_promote: Option<AutoPromote>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AutoPromote {
    Set,
    Remove,
}

impl RolloutPatch {
    fn apply(&self, spec: &mut RolloutSpec, status: &mut RolloutStatus) {
        if let Some(paused) = self.paused {
            spec.paused = paused;
        }
        if self.clear_pause_conditions {
            status.pause_conditions = None;
        }
        if let Some(index) = self.current_step_index {
            status.current_step_index = Some(index);
        }
        match self.auto_promote {
            Some(AutoPromote::Set) => status.auto_promote = Some(true),
            Some(AutoPromote::Remove) => status.auto_promote = None,
            None => {}
        }
    }
}

// ── Ability implementation ────────────────────────────────────────

/// Ability for the canary rollout CRD.
pub struct RolloutAbility;

impl RolloutAbility {
    /// Direct (uncached) fetch and conversion. `Ok(None)` means the
    /// object does not exist.
    async fn fetch_direct(
        &self,
        node: &WorkloadRef,
        client: &ClusterClient,
    ) -> WorkloadResult<Option<RolloutManifest>> {
        let gvr = gvr_rollout(&node.version);
        let raw = client.dynamic.get(&gvr, &node.namespace, &node.name).await?;
        match raw {
            Some(obj) => Ok(Some(convert(&node.name, obj)?)),
            None => Ok(None),
        }
    }

    /// Cached (informer) fetch and conversion. `Ok(None)` means the
    /// object does not exist in the cache.
    async fn fetch_cached(
        &self,
        node: &WorkloadRef,
        client: &ClusterClient,
    ) -> WorkloadResult<Option<RolloutManifest>> {
        let gvr = gvr_rollout(&node.version);
        let raw = client.cache.get(&gvr, &node.namespace, &node.name).await?;
        match raw {
            Some(obj) => Ok(Some(convert(&node.name, obj)?)),
            None => Ok(None),
        }
    }
}

fn convert(name: &str, raw: Value) -> WorkloadResult<RolloutManifest> {
    serde_json::from_value(raw)
        .map_err(|e| WorkloadError::Convert(format!("rollout {name}: {e}")))
}

#[async_trait::async_trait]
impl Ability for RolloutAbility {
    fn matches_kind(&self, group: &str, kind: &str) -> bool {
        group == ROLLOUT_GROUP && kind == ROLLOUT_KIND
    }

    async fn is_healthy(
        &self,
        node: &WorkloadRef,
        client: &ClusterClient,
    ) -> WorkloadResult<bool> {
        // Direct read: a lagging cache must not turn a live rollout
        // into a false healthy verdict. Absence is not a failure
        // signal for this check.
        let Some(manifest) = self.fetch_direct(node, client).await? else {
            return Ok(true);
        };
        let spec = manifest.spec.as_ref().ok_or_else(|| {
            WorkloadError::Convert(format!("rollout {} has no spec", node.name))
        })?;

        let required = spec.replicas.unwrap_or(1);
        let template = spec.template.clone().unwrap_or_default();

        let pods = client
            .cache
            .list(&gvr_pod(), &node.namespace, &template.metadata.labels)
            .await?;
        let pods = pods_from_objects(pods);
        debug!(node = %node.name, count = pods.len(), required, "listed pods for health check");

        let template_hash = canonical_hash(&template.spec);
        let mut matching: i64 = 0;
        'pods: for pod in &pods {
            if pod.phase != "Running" {
                debug!(node = %node.name, pod = %pod.name, phase = %pod.phase, "pod not running");
                continue;
            }
            if canonical_hash(&pod.spec) != template_hash {
                debug!(node = %node.name, pod = %pod.name, "pod spec hash not matched");
                continue;
            }
            for (key, value) in &template.metadata.annotations {
                if pod.annotations.get(key) != Some(value) {
                    debug!(node = %node.name, pod = %pod.name, %key, "pod annotation not matched");
                    continue 'pods;
                }
            }
            matching += 1;
        }

        if matching != required {
            debug!(node = %node.name, required, matching, "replica count not satisfied");
            return Ok(false);
        }

        // With replicas satisfied, healthy additionally means fully
        // promoted whenever a current step index is exposed.
        if let Some(index) = manifest.status.as_ref().and_then(|s| s.current_step_index) {
            let total = declared_steps(spec).len() as i64;
            debug!(node = %node.name, index, total, "checking promotion progress");
            return Ok(index == total);
        }
        Ok(true)
    }

    async fn list_pods(
        &self,
        node: &WorkloadRef,
        client: &ClusterClient,
    ) -> WorkloadResult<Vec<Pod>> {
        let manifest = self.fetch_cached(node, client).await?.ok_or_else(|| {
            WorkloadError::NotFound(format!("rollout {}/{}", node.namespace, node.name))
        })?;
        let labels = manifest
            .spec
            .as_ref()
            .and_then(|s| s.template.as_ref())
            .map(|t| t.metadata.labels.clone())
            .unwrap_or_default();

        let objects = client.cache.list(&gvr_pod(), &node.namespace, &labels).await?;
        Ok(pods_from_objects(objects))
    }

    async fn get_steps(&self, node: &WorkloadRef, client: &ClusterClient) -> WorkloadResult<Step> {
        // Direct read: accuracy matters more than latency here.
        let manifest = self.fetch_direct(node, client).await?.ok_or_else(|| {
            WorkloadError::NotFound(format!("rollout {}/{}", node.namespace, node.name))
        })?;
        let spec = manifest.spec.as_ref().ok_or_else(|| {
            WorkloadError::Convert(format!("rollout {} has no spec", node.name))
        })?;

        let replicas_total = spec.replicas.unwrap_or(1);
        let steps = declared_steps(spec);
        if steps.is_empty() {
            return Ok(Step {
                index: 0,
                total: 1,
                replicas: vec![replicas_total],
                manual_paused: false,
                auto_promote: false,
                extra: None,
            });
        }

        // Cumulative replica target of each effective step.
        let mut cumulative: Vec<i64> = Vec::new();
        for step in steps {
            if let Some(weight) = step.set_weight {
                let target = (weight as f64 / 100.0 * replicas_total as f64).ceil() as i64;
                cumulative.push(target);
            } else if let Some(count) = step.set_replica {
                cumulative.push(count);
            }
        }

        let mut increments: Vec<i64> = Vec::with_capacity(cumulative.len());
        for (i, &target) in cumulative.iter().enumerate() {
            if i == 0 {
                increments.push(target);
            } else {
                increments.push(target - cumulative[i - 1]);
            }
        }

        let status = manifest.status.clone().unwrap_or_default();

        // Only trust the reported index while the declared steps still
        // match the hash stored when they were last observed; a changed
        // strategy restarts progress accounting.
        let mut index = 0usize;
        if status.current_step_hash.as_deref() == Some(step_list_hash(steps).as_str()) {
            if let Some(reported) = status.current_step_index {
                let clamp = (reported.max(0) as usize).min(steps.len());
                for step in &steps[..clamp] {
                    if step.has_replica_effect() {
                        index += 1;
                    }
                }
            }
        }

        let extra = serde_json::to_string(&json!({"currentIndex": status.current_step_index}))
            .unwrap_or_else(|_| "{}".to_string());

        Ok(Step {
            index,
            total: increments.len(),
            replicas: increments,
            manual_paused: spec.paused,
            auto_promote: status.auto_promote.unwrap_or(false),
            extra: Some(extra),
        })
    }

    fn action(&self, name: &str, live: &Value) -> WorkloadResult<Value> {
        let mut manifest = convert("live object", live.clone())?;
        let mut spec = manifest
            .spec
            .take()
            .ok_or_else(|| WorkloadError::InvalidArgument("spec not found".to_string()))?;
        let mut status = manifest
            .status
            .take()
            .ok_or_else(|| WorkloadError::InvalidArgument("status not found".to_string()))?;

        let patch = match name {
            "resume" => RolloutPatch {
                paused: Some(false),
                clear_pause_conditions: true,
                ..Default::default()
            },
            "pause" => RolloutPatch {
                paused: Some(true),
                ..Default::default()
            },
            "promote-full" => RolloutPatch {
                paused: Some(false),
                clear_pause_conditions: true,
                current_step_index: Some(declared_steps(&spec).len() as i64),
                ..Default::default()
            },
            "promote" => RolloutPatch {
                paused: Some(false),
                clear_pause_conditions: true,
                ..Default::default()
            },
            "auto-promote" => RolloutPatch {
                paused: Some(false),
                clear_pause_conditions: true,
                auto_promote: Some(AutoPromote::Set),
                ..Default::default()
            },
            "cancel-auto-promote" => RolloutPatch {
                auto_promote: Some(AutoPromote::Remove),
                ..Default::default()
            },
            other => {
                return Err(WorkloadError::InvalidArgument(format!(
                    "unsupported action: {other}"
                )));
            }
        };

        patch.apply(&mut spec, &mut status);
        manifest.spec = Some(spec);
        manifest.status = Some(status);

        serde_json::to_value(&manifest)
            .map_err(|e| WorkloadError::Convert(format!("serialize mutated rollout: {e}")))
    }
}

/// The declared canary steps, empty when no canary strategy exists.
fn declared_steps(spec: &RolloutSpec) -> &[CanaryStep] {
    spec.strategy
        .as_ref()
        .and_then(|s| s.canary.as_ref())
        .map(|c| c.steps.as_slice())
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::InMemoryCluster;
    use serde_json::json;
    use std::sync::Arc;

    fn node() -> WorkloadRef {
        WorkloadRef {
            namespace: "prod".to_string(),
            name: "api".to_string(),
            group: ROLLOUT_GROUP.to_string(),
            version: "v1alpha1".to_string(),
            kind: ROLLOUT_KIND.to_string(),
        }
    }

    fn client(cluster: &InMemoryCluster) -> ClusterClient {
        ClusterClient {
            cache: Arc::new(cluster.clone()),
            dynamic: Arc::new(cluster.clone()),
        }
    }

    fn pod_spec() -> Value {
        json!({"containers": [{"name": "app", "image": "registry/app:v2"}]})
    }

    fn rollout(replicas: i64, steps: Value) -> Value {
        json!({
            "apiVersion": "argoproj.io/v1alpha1",
            "kind": "Rollout",
            "metadata": {"name": "api", "namespace": "prod"},
            "spec": {
                "replicas": replicas,
                "template": {
                    "metadata": {
                        "labels": {"app": "api"},
                        "annotations": {"config/checksum": "abc"}
                    },
                    "spec": pod_spec()
                },
                "strategy": {"canary": {"steps": steps}}
            },
            "status": {}
        })
    }

    fn running_pod(name: &str) -> Value {
        json!({
            "metadata": {
                "name": name,
                "namespace": "prod",
                "labels": {"app": "api"},
                "annotations": {"config/checksum": "abc", "pod-only": "ignored"}
            },
            "spec": pod_spec(),
            "status": {"phase": "Running"}
        })
    }

    /// Hash the declared step list of a rollout object, as the backend
    /// would persist it.
    fn stored_hash(obj: &Value) -> String {
        let manifest: RolloutManifest = serde_json::from_value(obj.clone()).unwrap();
        step_list_hash(declared_steps(manifest.spec.as_ref().unwrap()))
    }

    async fn seed(obj: Value) -> (InMemoryCluster, ClusterClient) {
        let cluster = InMemoryCluster::new();
        cluster
            .insert(&gvr_rollout("v1alpha1"), "prod", "api", obj)
            .await;
        let c = client(&cluster);
        (cluster, c)
    }

    // ── get_steps ────────────────────────────────────────────────

    #[tokio::test]
    async fn weight_steps_become_incremental_replicas() {
        let obj = rollout(4, json!([{"setWeight": 25}, {"setWeight": 50}, {"setWeight": 100}]));
        let (_cluster, client) = seed(obj).await;

        let step = RolloutAbility.get_steps(&node(), &client).await.unwrap();
        assert_eq!(step.total, 3);
        assert_eq!(step.replicas, vec![1, 1, 2]);
        assert_eq!(step.replicas.iter().sum::<i64>(), 4);
        assert_eq!(step.index, 0);
    }

    #[tokio::test]
    async fn replica_count_steps_use_literal_counts() {
        let obj = rollout(5, json!([{"setReplica": 2}, {"setReplica": 5}]));
        let (_cluster, client) = seed(obj).await;

        let step = RolloutAbility.get_steps(&node(), &client).await.unwrap();
        assert_eq!(step.replicas, vec![2, 3]);
        assert_eq!(step.total, 2);
    }

    #[tokio::test]
    async fn no_declared_steps_yields_synthetic_step() {
        let obj = rollout(3, json!([]));
        let (_cluster, client) = seed(obj).await;

        let step = RolloutAbility.get_steps(&node(), &client).await.unwrap();
        assert_eq!(step.index, 0);
        assert_eq!(step.total, 1);
        assert_eq!(step.replicas, vec![3]);
    }

    #[tokio::test]
    async fn replicas_default_to_one() {
        let mut obj = rollout(1, json!([]));
        obj["spec"].as_object_mut().unwrap().remove("replicas");
        let (_cluster, client) = seed(obj).await;

        let step = RolloutAbility.get_steps(&node(), &client).await.unwrap();
        assert_eq!(step.replicas, vec![1]);
    }

    #[tokio::test]
    async fn reported_index_trusted_only_with_matching_hash() {
        let mut obj = rollout(4, json!([{"setWeight": 25}, {"setWeight": 100}]));
        let hash = stored_hash(&obj);
        obj["status"] = json!({"currentStepIndex": 2, "currentStepHash": hash});
        let (_cluster, client) = seed(obj).await;

        let step = RolloutAbility.get_steps(&node(), &client).await.unwrap();
        assert_eq!(step.index, 2);
    }

    #[tokio::test]
    async fn stale_hash_forces_index_zero() {
        let mut obj = rollout(4, json!([{"setWeight": 25}, {"setWeight": 100}]));
        obj["status"] = json!({"currentStepIndex": 2, "currentStepHash": "stale"});
        let (_cluster, client) = seed(obj).await;

        let step = RolloutAbility.get_steps(&node(), &client).await.unwrap();
        assert_eq!(step.index, 0);
    }

    #[tokio::test]
    async fn pause_steps_do_not_advance_visible_index() {
        let steps = json!([{"setWeight": 25}, {"pause": {}}, {"setWeight": 100}]);
        let mut obj = rollout(4, steps);
        let hash = stored_hash(&obj);
        // Reported index 2: past the first weight step and the pause.
        obj["status"] = json!({"currentStepIndex": 2, "currentStepHash": hash});
        let (_cluster, client) = seed(obj).await;

        let step = RolloutAbility.get_steps(&node(), &client).await.unwrap();
        assert_eq!(step.index, 1);
        assert_eq!(step.total, 2);
        assert_eq!(step.replicas, vec![1, 3]);
    }

    #[tokio::test]
    async fn reported_index_clamped_to_step_count() {
        let mut obj = rollout(2, json!([{"setWeight": 100}]));
        let hash = stored_hash(&obj);
        obj["status"] = json!({"currentStepIndex": 9, "currentStepHash": hash});
        let (_cluster, client) = seed(obj).await;

        let step = RolloutAbility.get_steps(&node(), &client).await.unwrap();
        assert_eq!(step.index, 1);
    }

    #[tokio::test]
    async fn pause_and_auto_promote_surfaced() {
        let mut obj = rollout(2, json!([{"setWeight": 100}]));
        obj["spec"]["paused"] = json!(true);
        obj["status"] = json!({"currentStepIndex": 0, "autoPromote": true});
        let (_cluster, client) = seed(obj).await;

        let step = RolloutAbility.get_steps(&node(), &client).await.unwrap();
        assert!(step.manual_paused);
        assert!(step.auto_promote);
        let extra: Value = serde_json::from_str(step.extra.as_deref().unwrap()).unwrap();
        assert_eq!(extra["currentIndex"], 0);
    }

    #[tokio::test]
    async fn get_steps_missing_object_is_not_found() {
        let cluster = InMemoryCluster::new();
        let client = client(&cluster);
        let err = RolloutAbility.get_steps(&node(), &client).await.unwrap_err();
        assert!(matches!(err, WorkloadError::NotFound(_)));
    }

    // ── is_healthy ───────────────────────────────────────────────

    #[tokio::test]
    async fn healthy_when_all_replicas_match_and_no_step_index() {
        let (cluster, client) = seed(rollout(2, json!([]))).await;
        cluster.insert(&gvr_pod(), "prod", "api-0", running_pod("api-0")).await;
        cluster.insert(&gvr_pod(), "prod", "api-1", running_pod("api-1")).await;

        assert!(RolloutAbility.is_healthy(&node(), &client).await.unwrap());
    }

    #[tokio::test]
    async fn unhealthy_when_replica_count_differs() {
        let (cluster, client) = seed(rollout(2, json!([]))).await;
        cluster.insert(&gvr_pod(), "prod", "api-0", running_pod("api-0")).await;

        assert!(!RolloutAbility.is_healthy(&node(), &client).await.unwrap());
    }

    #[tokio::test]
    async fn non_running_pods_do_not_count() {
        let (cluster, client) = seed(rollout(1, json!([]))).await;
        let mut pod = running_pod("api-0");
        pod["status"]["phase"] = json!("Pending");
        cluster.insert(&gvr_pod(), "prod", "api-0", pod).await;

        assert!(!RolloutAbility.is_healthy(&node(), &client).await.unwrap());
    }

    #[tokio::test]
    async fn stale_spec_pods_do_not_count() {
        let (cluster, client) = seed(rollout(1, json!([]))).await;
        let mut pod = running_pod("api-0");
        pod["spec"]["containers"][0]["image"] = json!("registry/app:v1");
        cluster.insert(&gvr_pod(), "prod", "api-0", pod).await;

        assert!(!RolloutAbility.is_healthy(&node(), &client).await.unwrap());
    }

    #[tokio::test]
    async fn missing_template_annotation_disqualifies_pod() {
        let (cluster, client) = seed(rollout(1, json!([]))).await;
        let mut pod = running_pod("api-0");
        pod["metadata"]["annotations"] = json!({"pod-only": "ignored"});
        cluster.insert(&gvr_pod(), "prod", "api-0", pod).await;

        assert!(!RolloutAbility.is_healthy(&node(), &client).await.unwrap());
    }

    #[tokio::test]
    async fn extra_pod_annotations_are_ignored() {
        let (cluster, client) = seed(rollout(1, json!([]))).await;
        let mut pod = running_pod("api-0");
        pod["metadata"]["annotations"]["extra"] = json!("anything");
        cluster.insert(&gvr_pod(), "prod", "api-0", pod).await;

        assert!(RolloutAbility.is_healthy(&node(), &client).await.unwrap());
    }

    #[tokio::test]
    async fn healthy_requires_full_promotion_when_index_exposed() {
        let mut obj = rollout(1, json!([{"setWeight": 50}, {"setWeight": 100}]));
        obj["status"] = json!({"currentStepIndex": 1});
        let (cluster, client) = seed(obj).await;
        cluster.insert(&gvr_pod(), "prod", "api-0", running_pod("api-0")).await;

        assert!(!RolloutAbility.is_healthy(&node(), &client).await.unwrap());
    }

    #[tokio::test]
    async fn fully_promoted_index_is_healthy() {
        let mut obj = rollout(1, json!([{"setWeight": 50}, {"setWeight": 100}]));
        obj["status"] = json!({"currentStepIndex": 2});
        let (cluster, client) = seed(obj).await;
        cluster.insert(&gvr_pod(), "prod", "api-0", running_pod("api-0")).await;

        assert!(RolloutAbility.is_healthy(&node(), &client).await.unwrap());
    }

    #[tokio::test]
    async fn health_reads_live_state_not_cache() {
        // Rollout exists only through the direct reader; the cache is
        // empty and lagging. With no matching pods the verdict must be
        // unhealthy, not absent-therefore-healthy.
        let live = InMemoryCluster::new();
        live.insert(&gvr_rollout("v1alpha1"), "prod", "api", rollout(2, json!([])))
            .await;
        let stale_cache = InMemoryCluster::new();
        let client = ClusterClient {
            cache: Arc::new(stale_cache),
            dynamic: Arc::new(live),
        };

        assert!(!RolloutAbility.is_healthy(&node(), &client).await.unwrap());
    }

    #[tokio::test]
    async fn list_pods_resolves_rollout_through_cache() {
        // The inverse surface split: list_pods answers from the
        // informer cache, so a rollout visible only to the direct
        // reader is not found there.
        let live = InMemoryCluster::new();
        live.insert(&gvr_rollout("v1alpha1"), "prod", "api", rollout(2, json!([])))
            .await;
        let client = ClusterClient {
            cache: Arc::new(InMemoryCluster::new()),
            dynamic: Arc::new(live),
        };

        let err = RolloutAbility.list_pods(&node(), &client).await.unwrap_err();
        assert!(matches!(err, WorkloadError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_object_reports_healthy() {
        // Absence is deliberately not a failure signal for this check.
        let cluster = InMemoryCluster::new();
        let client = client(&cluster);
        assert!(RolloutAbility.is_healthy(&node(), &client).await.unwrap());
    }

    // ── list_pods ────────────────────────────────────────────────

    #[tokio::test]
    async fn list_pods_selects_by_template_labels() {
        let (cluster, client) = seed(rollout(2, json!([]))).await;
        cluster.insert(&gvr_pod(), "prod", "api-0", running_pod("api-0")).await;
        let mut other = running_pod("other-0");
        other["metadata"]["labels"] = json!({"app": "other"});
        cluster.insert(&gvr_pod(), "prod", "other-0", other).await;

        let pods = RolloutAbility.list_pods(&node(), &client).await.unwrap();
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].name, "api-0");
    }

    // ── action ───────────────────────────────────────────────────

    #[test]
    fn matches_kind_exact() {
        assert!(RolloutAbility.matches_kind("argoproj.io", "Rollout"));
        assert!(!RolloutAbility.matches_kind("argoproj.io", "rollout"));
        assert!(!RolloutAbility.matches_kind("apps", "Rollout"));
    }

    fn action_input() -> Value {
        let mut obj = rollout(4, json!([{"setWeight": 25}, {"setWeight": 100}]));
        obj["status"] = json!({
            "currentStepIndex": 1,
            "pauseConditions": [{"reason": "CanaryPauseStep"}],
            "autoPromote": false,
            "observedGeneration": "7"
        });
        obj
    }

    #[test]
    fn action_pause_sets_paused_only() {
        let input = action_input();
        let out = RolloutAbility.action("pause", &input).unwrap();
        assert_eq!(out["spec"]["paused"], json!(true));
        // Everything else untouched.
        assert_eq!(out["status"]["pauseConditions"], input["status"]["pauseConditions"]);
        assert_eq!(out["status"]["currentStepIndex"], json!(1));
    }

    #[test]
    fn action_resume_clears_pause_state() {
        let out = RolloutAbility.action("resume", &action_input()).unwrap();
        assert_eq!(out["spec"]["paused"], json!(false));
        assert!(out["status"].get("pauseConditions").is_none());
    }

    #[test]
    fn action_promote_full_jumps_to_last_step() {
        let out = RolloutAbility.action("promote-full", &action_input()).unwrap();
        assert_eq!(out["spec"]["paused"], json!(false));
        assert_eq!(out["status"]["currentStepIndex"], json!(2));
        assert!(out["status"].get("pauseConditions").is_none());
    }

    #[test]
    fn action_promote_keeps_current_index() {
        let out = RolloutAbility.action("promote", &action_input()).unwrap();
        assert_eq!(out["spec"]["paused"], json!(false));
        assert_eq!(out["status"]["currentStepIndex"], json!(1));
        assert!(out["status"].get("pauseConditions").is_none());
    }

    #[test]
    fn action_auto_promote_sets_flag() {
        let out = RolloutAbility.action("auto-promote", &action_input()).unwrap();
        assert_eq!(out["status"]["autoPromote"], json!(true));
        assert_eq!(out["spec"]["paused"], json!(false));
        assert!(out["status"].get("pauseConditions").is_none());
    }

    #[test]
    fn action_cancel_auto_promote_removes_field() {
        let out = RolloutAbility
            .action("cancel-auto-promote", &action_input())
            .unwrap();
        assert!(out["status"].get("autoPromote").is_none());
        // Does not touch pause state.
        assert_eq!(
            out["status"]["pauseConditions"],
            action_input()["status"]["pauseConditions"]
        );
    }

    #[test]
    fn action_unknown_name_is_invalid_argument() {
        let input = action_input();
        let err = RolloutAbility.action("restart", &input).unwrap_err();
        assert!(matches!(err, WorkloadError::InvalidArgument(_)));
        // Input object is untouched.
        assert_eq!(input, action_input());
    }

    #[test]
    fn action_requires_spec_and_status() {
        let no_status = json!({"spec": {"replicas": 1}});
        let err = RolloutAbility.action("pause", &no_status).unwrap_err();
        assert!(matches!(err, WorkloadError::InvalidArgument(_)));

        let no_spec = json!({"status": {}});
        let err = RolloutAbility.action("pause", &no_spec).unwrap_err();
        assert!(matches!(err, WorkloadError::InvalidArgument(_)));
    }

    #[test]
    fn action_preserves_unknown_fields() {
        let out = RolloutAbility.action("pause", &action_input()).unwrap();
        assert_eq!(out["status"]["observedGeneration"], json!("7"));
        assert_eq!(out["apiVersion"], json!("argoproj.io/v1alpha1"));
        assert_eq!(out["metadata"]["name"], json!("api"));
    }
}
