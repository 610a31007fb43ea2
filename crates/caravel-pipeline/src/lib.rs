//! caravel-pipeline — the deployment pipeline state machine.
//!
//! Coordinates one deploy attempt across three external systems: the
//! gitops configuration repository, the CD backend, and the state
//! store. Forward-only; failures abort at the current stage and leave
//! the persisted status as the retry anchor.

pub mod deploy;
pub mod error;

pub use deploy::{DeployResponse, Deployer};
pub use error::{PipelineError, PipelineResult};
