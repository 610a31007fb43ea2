//! In-memory cluster backend.
//!
//! Implements both read surfaces over a plain object map. Used by
//! tests and by the daemon's standalone mode, following the same
//! pattern as the state store's in-memory backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use caravel_core::GroupVersionResource;

use crate::ability::{ClusterClient, DynamicReader, ObjectCache};
use crate::error::WorkloadResult;

type ObjectKey = (GroupVersionResource, String, String);

/// Cluster state held entirely in memory, keyed by gvr + namespace + name.
#[derive(Clone, Default)]
pub struct InMemoryCluster {
    objects: Arc<RwLock<HashMap<ObjectKey, Value>>>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object.
    pub async fn insert(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        name: &str,
        object: Value,
    ) {
        let key = (gvr.clone(), namespace.to_string(), name.to_string());
        self.objects.write().await.insert(key, object);
    }

    /// Build a [`ClusterClient`] serving both read surfaces from this
    /// in-memory state.
    pub fn client(&self) -> ClusterClient {
        ClusterClient {
            cache: Arc::new(self.clone()),
            dynamic: Arc::new(self.clone()),
        }
    }

    /// Remove an object, returning it if it existed.
    pub async fn remove(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        name: &str,
    ) -> Option<Value> {
        let key = (gvr.clone(), namespace.to_string(), name.to_string());
        self.objects.write().await.remove(&key)
    }
}

/// Whether an object's labels contain every pair in the selector.
fn labels_match(object: &Value, selector: &BTreeMap<String, String>) -> bool {
    let labels = object
        .pointer("/metadata/labels")
        .and_then(Value::as_object);
    selector.iter().all(|(k, v)| {
        labels
            .and_then(|l| l.get(k))
            .and_then(Value::as_str)
            .is_some_and(|value| value == v)
    })
}

#[async_trait]
impl ObjectCache for InMemoryCluster {
    async fn get(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        name: &str,
    ) -> WorkloadResult<Option<Value>> {
        let key = (gvr.clone(), namespace.to_string(), name.to_string());
        Ok(self.objects.read().await.get(&key).cloned())
    }

    async fn list(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> WorkloadResult<Vec<Value>> {
        let objects = self.objects.read().await;
        Ok(objects
            .iter()
            .filter(|((g, ns, _), obj)| {
                g == gvr && ns == namespace && labels_match(obj, selector)
            })
            .map(|(_, obj)| obj.clone())
            .collect())
    }
}

#[async_trait]
impl DynamicReader for InMemoryCluster {
    async fn get(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        name: &str,
    ) -> WorkloadResult<Option<Value>> {
        ObjectCache::get(self, gvr, namespace, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pods_gvr() -> GroupVersionResource {
        GroupVersionResource::new("", "v1", "pods")
    }

    #[tokio::test]
    async fn insert_get_remove() {
        let cluster = InMemoryCluster::new();
        let gvr = pods_gvr();
        cluster.insert(&gvr, "prod", "a", json!({"x": 1})).await;

        let got = ObjectCache::get(&cluster, &gvr, "prod", "a").await.unwrap();
        assert_eq!(got, Some(json!({"x": 1})));

        assert!(cluster.remove(&gvr, "prod", "a").await.is_some());
        let got = ObjectCache::get(&cluster, &gvr, "prod", "a").await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn list_filters_namespace_and_labels() {
        let cluster = InMemoryCluster::new();
        let gvr = pods_gvr();
        cluster
            .insert(&gvr, "prod", "a", json!({"metadata": {"labels": {"app": "api"}}}))
            .await;
        cluster
            .insert(&gvr, "prod", "b", json!({"metadata": {"labels": {"app": "web"}}}))
            .await;
        cluster
            .insert(&gvr, "dev", "c", json!({"metadata": {"labels": {"app": "api"}}}))
            .await;

        let selector = BTreeMap::from([("app".to_string(), "api".to_string())]);
        let found = cluster.list(&gvr, "prod", &selector).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn empty_selector_matches_all_in_namespace() {
        let cluster = InMemoryCluster::new();
        let gvr = pods_gvr();
        cluster.insert(&gvr, "prod", "a", json!({})).await;
        cluster.insert(&gvr, "prod", "b", json!({})).await;

        let found = cluster.list(&gvr, "prod", &BTreeMap::new()).await.unwrap();
        assert_eq!(found.len(), 2);
    }
}
