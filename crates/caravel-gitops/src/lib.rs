//! caravel-gitops — access to the cluster configuration repositories.
//!
//! Every cluster owns a small Git repository holding its rendered
//! configuration. The pipeline writes changes to the gitops branch and
//! merges them into the stable branch the CD backend deploys from.
//! Repository storage and merge mechanics live behind [`GitopsRepo`];
//! this crate defines the facade, the repository tree layout, and an
//! in-memory implementation for tests and the standalone daemon.

pub mod memory;
pub mod repo;
pub mod tree;

pub use memory::{GitopsCall, InMemoryGitops, default_value_files};
pub use repo::{EnvValue, GitopsError, GitopsRepo, GitopsResult, RepoInfo};
