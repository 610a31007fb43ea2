//! Layout of a cluster configuration repository.
//!
//! File paths and value namespaces are shared between the writer (the
//! pipeline) and whatever renders the final manifests, so they live in
//! one place.

/// Helm chart descriptor.
pub const FILE_CHART: &str = "Chart.yaml";
/// Application-level values.
pub const FILE_APPLICATION: &str = "application.yaml";
/// Cluster tags.
pub const FILE_TAGS: &str = "tags.yaml";
/// Operator-managed overrides.
pub const FILE_SRE: &str = "sre/sre.yaml";
/// Platform-injected base values.
pub const FILE_BASE: &str = "system/caravel.yaml";
/// Environment values (namespace, region, autoscaling bounds).
pub const FILE_ENV: &str = "system/env.yaml";
/// Restart marker bumped to force a rollout restart.
pub const FILE_RESTART: &str = "system/restart.yaml";
/// Build pipeline definition.
pub const FILE_PIPELINE: &str = "pipeline/pipeline.yaml";
/// Output of the last build pipeline (image url etc.).
pub const FILE_PIPELINE_OUTPUT: &str = "pipeline/pipeline-output.yaml";

/// Value namespace for environment values.
pub const VALUE_NAMESPACE_ENV: &str = "env";
/// Value namespace for platform base values.
pub const VALUE_NAMESPACE_BASE: &str = "caravel";

/// Branch the pipeline writes configuration changes to.
pub const BRANCH_GITOPS: &str = "gitops";
/// Branch the CD backend deploys from.
pub const BRANCH_STABLE: &str = "master";

/// Repository group for active clusters.
pub const GROUP_CLUSTERS: &str = "clusters";
/// Repository group clusters are moved to while being reclaimed.
pub const GROUP_RECYCLING_CLUSTERS: &str = "recycling-clusters";
