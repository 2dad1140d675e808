//! pf-core: stable foundation for pipeflow.
//!
//! Contains:
//! - ids (stable compact IDs for topology objects)
//! - error (shared error types)

pub mod error;
pub mod ids;

// Re-exports: nice ergonomics for downstream crates
pub use error::{PfError, PfResult};
pub use ids::*;
