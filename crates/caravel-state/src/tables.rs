//! redb table definitions for the Caravel state store.
//!
//! Numeric-id entities use `u64` keys; template releases are keyed by
//! `{template}/{release}` and regions by region name. Values are
//! JSON-serialized domain types.

use redb::TableDefinition;

/// Pipeline run records keyed by run id.
pub const PIPELINE_RUNS: TableDefinition<u64, &[u8]> = TableDefinition::new("pipeline_runs");

/// Cluster records keyed by cluster id.
pub const CLUSTERS: TableDefinition<u64, &[u8]> = TableDefinition::new("clusters");

/// Applications keyed by application id.
pub const APPLICATIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("applications");

/// Template releases keyed by `{template}/{release}`.
pub const TEMPLATE_RELEASES: TableDefinition<&str, &[u8]> =
    TableDefinition::new("template_releases");

/// Regions keyed by region name.
pub const REGIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("regions");
