pub mod config;
pub mod hash;
pub mod types;

pub use config::CaravelConfig;
pub use hash::canonical_hash;
pub use types::*;
