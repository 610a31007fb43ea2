//! caravel-workload — the progressive-delivery engine.
//!
//! Abstracts heterogeneous Kubernetes workload kinds behind a uniform
//! health/progress model. Each workload kind is handled by an
//! [`Ability`]: a stateless strategy that knows how to read health and
//! rollout progress from live cluster state for that kind. Abilities
//! are looked up through an [`AbilityRegistry`] built once at startup.
//!
//! # Components
//!
//! - **`ability`** — the `Ability` contract, cluster read surfaces, pod model
//! - **`registry`** — group/kind to ability dispatch table
//! - **`rollout`** — the canary-rollout ability (`argoproj.io/Rollout`)
//! - **`cluster`** — in-memory cluster backend for tests and dev mode

pub mod ability;
pub mod cluster;
pub mod error;
pub mod registry;
pub mod rollout;

pub use ability::{Ability, ClusterClient, DynamicReader, ObjectCache, Pod, pods_from_objects};
pub use cluster::InMemoryCluster;
pub use error::{WorkloadError, WorkloadResult};
pub use registry::AbilityRegistry;
pub use rollout::RolloutAbility;
