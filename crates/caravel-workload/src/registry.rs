//! Ability registry — group/kind to ability dispatch.
//!
//! Built by single-threaded startup code before any request traffic
//! and read-only afterwards, so lookups need no locking. Components
//! receive the registry by `Arc` handle; there is no global table.
//! If kinds ever had to be added at runtime this would need to become
//! a copy-on-write table behind a read/write lock.

use std::sync::Arc;

use caravel_core::GroupVersionResource;

use crate::ability::Ability;

struct RegistryEntry {
    ability: Arc<dyn Ability>,
    resources: Vec<GroupVersionResource>,
}

/// Maps a workload's group/kind identity to the ability that
/// understands it.
#[derive(Default)]
pub struct AbilityRegistry {
    entries: Vec<RegistryEntry>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ability and the API resources it reads. Called once
    /// per known workload kind at process startup; there is no removal.
    pub fn register(&mut self, ability: Arc<dyn Ability>, resources: Vec<GroupVersionResource>) {
        self.entries.push(RegistryEntry { ability, resources });
    }

    /// Resolve the ability for a group/kind, if any is registered.
    pub fn resolve(&self, group: &str, kind: &str) -> Option<Arc<dyn Ability>> {
        self.entries
            .iter()
            .find(|e| e.ability.matches_kind(group, kind))
            .map(|e| Arc::clone(&e.ability))
    }

    /// Every API resource any registered ability reads, deduplicated.
    /// Informer caches are primed from this set.
    pub fn watched_resources(&self) -> Vec<GroupVersionResource> {
        let mut all = Vec::new();
        for entry in &self.entries {
            for gvr in &entry.resources {
                if !all.contains(gvr) {
                    all.push(gvr.clone());
                }
            }
        }
        all
    }
}
