//! Pipeline error types.
//!
//! The state machine never retries internally; it aborts at the first
//! failing stage and surfaces the wrapped error, leaving the run's
//! last-persisted status as the retry anchor.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors returned by the deployment pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A referenced record (run, cluster, application, template
    /// release, region) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A state store operation failed.
    #[error(transparent)]
    State(#[from] caravel_state::StateError),

    /// A gitops repository call failed.
    #[error(transparent)]
    Gitops(#[from] caravel_gitops::GitopsError),

    /// A CD backend call failed.
    #[error(transparent)]
    Cd(#[from] caravel_cd::CdError),
}
