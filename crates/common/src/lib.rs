//! Shared types for the moonwake scene viewer.

mod types;

pub use types::{NodeId, Transform, rgb};
