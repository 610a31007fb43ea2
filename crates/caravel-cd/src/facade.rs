//! CD facade: the single entry point callers use to query workloads
//! and drive the delivery backend.
//!
//! Workload queries resolve an ability by the reference's group/kind
//! and dispatch through it; lifecycle calls forward to the configured
//! [`CdBackend`]. The facade owns no durable state.

use std::sync::Arc;

use caravel_core::{GroupVersionResource, Step, WorkloadRef};
use caravel_workload::{Ability, AbilityRegistry, ClusterClient, Pod};
use serde_json::Value;
use tracing::debug;

use crate::backend::{CdBackend, CreateClusterParams, DeployClusterParams};
use crate::error::{CdError, CdResult};

pub struct CdFacade {
    client: ClusterClient,
    registry: Arc<AbilityRegistry>,
    backend: Arc<dyn CdBackend>,
}

impl CdFacade {
    pub fn new(
        client: ClusterClient,
        registry: Arc<AbilityRegistry>,
        backend: Arc<dyn CdBackend>,
    ) -> Self {
        Self {
            client,
            registry,
            backend,
        }
    }

    fn resolve(&self, node: &WorkloadRef) -> CdResult<Arc<dyn Ability>> {
        self.registry
            .resolve(&node.group, &node.kind)
            .ok_or_else(|| CdError::UnsupportedKind(format!("{}/{}", node.group, node.kind)))
    }

    /// Whether the workload is fully rolled out and serving.
    pub async fn is_healthy(&self, node: &WorkloadRef) -> CdResult<bool> {
        let ability = self.resolve(node)?;
        Ok(ability.is_healthy(node, &self.client).await?)
    }

    /// Rollout progress reduced to the uniform step model.
    pub async fn get_steps(&self, node: &WorkloadRef) -> CdResult<Step> {
        let ability = self.resolve(node)?;
        Ok(ability.get_steps(node, &self.client).await?)
    }

    /// Pods currently owned by the workload.
    pub async fn list_pods(&self, node: &WorkloadRef) -> CdResult<Vec<Pod>> {
        let ability = self.resolve(node)?;
        Ok(ability.list_pods(node, &self.client).await?)
    }

    /// Read the live object uncached, apply the named action to it and
    /// return the mutated copy. The caller persists the result.
    pub async fn exec_action(&self, node: &WorkloadRef, action: &str) -> CdResult<Value> {
        let ability = self.resolve(node)?;
        debug!(
            action,
            kind = %node.kind,
            namespace = %node.namespace,
            name = %node.name,
            "executing workload action"
        );
        let gvr = node_gvr(node);
        let live = self
            .client
            .dynamic
            .get(&gvr, &node.namespace, &node.name)
            .await?
            .ok_or_else(|| CdError::NotFound(format!("{}/{}", node.namespace, node.name)))?;
        Ok(ability.action(action, &live)?)
    }

    pub async fn create_cluster(&self, params: &CreateClusterParams) -> CdResult<()> {
        self.backend.create_cluster(params).await
    }

    pub async fn deploy_cluster(&self, params: &DeployClusterParams) -> CdResult<()> {
        self.backend.deploy_cluster(params).await
    }
}

/// Resource a workload reference resolves to. The naive lowercase
/// plural is correct for every kind the registry carries.
fn node_gvr(node: &WorkloadRef) -> GroupVersionResource {
    GroupVersionResource::new(
        &node.group,
        &node.version,
        &format!("{}s", node.kind.to_lowercase()),
    )
}
