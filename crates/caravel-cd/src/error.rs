//! CD layer error types.

use thiserror::Error;

/// Result type alias for CD operations.
pub type CdResult<T> = Result<T, CdError>;

/// Errors returned by the CD facade and backends.
#[derive(Debug, Error)]
pub enum CdError {
    /// No registered ability handles the workload's group/kind.
    #[error("unsupported workload kind: {0}")]
    UnsupportedKind(String),

    /// The referenced live object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend rejected or failed the call.
    #[error("cd backend: {0}")]
    Upstream(String),

    /// A workload query failed beneath the facade.
    #[error(transparent)]
    Workload(#[from] caravel_workload::WorkloadError),
}
