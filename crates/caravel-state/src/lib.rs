//! caravel-state — embedded state store for the control plane.
//!
//! Persists the database records the deployment pipeline coordinates:
//! pipeline runs, clusters, applications, template releases, and
//! regions. All values are JSON-serialized into redb tables; an
//! in-memory backend is available for tests.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
