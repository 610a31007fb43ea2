//! Workload layer error types.
//!
//! The ability layer never retries internally; every failure carries
//! the resource name so callers can log and triage.

use thiserror::Error;

/// Result type alias for workload operations.
pub type WorkloadResult<T> = Result<T, WorkloadError>;

/// Errors returned by abilities and the cluster read surfaces.
#[derive(Debug, Error)]
pub enum WorkloadError {
    /// The referenced object does not exist in the cluster.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unsupported action name or missing spec/status substructure.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The live object could not be interpreted as the expected kind.
    #[error("failed to convert object: {0}")]
    Convert(String),

    /// A Kubernetes get/list failed.
    #[error("read failed: {0}")]
    ReadFailed(String),
}
