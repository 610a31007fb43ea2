//! caravel-cd — continuous-delivery facade.
//!
//! Bridges the deployment pipeline and the workload ability layer:
//! callers hand the facade a workload reference and get back health,
//! progress, pods, or a mutated object, without knowing which ability
//! served the call. Cluster lifecycle (create, deploy-to-revision)
//! forwards to a pluggable [`CdBackend`].

pub mod backend;
pub mod error;
pub mod facade;

pub use backend::{
    CdBackend, CdCall, CreateClusterParams, DeployClusterParams, RecordingCd,
};
pub use error::{CdError, CdResult};
pub use facade::CdFacade;
