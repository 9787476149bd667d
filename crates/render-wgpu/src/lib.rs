//! wgpu render backend for the moonwake viewer.
//!
//! Renders the night-ocean scene: cubemap sky, lit meshes (models and
//! generated primitives), the animated water plane, and a bloom
//! post-processing chain, plus an optional debug grid.
//!
//! # Invariants
//! - The renderer never mutates the scene; it uploads GPU copies of assets
//!   as their loads complete and draws whatever is resident.
//! - All offscreen targets are rebuilt on resize; nothing else is.

mod bloom;
mod gpu;
mod mesh;
mod shaders;

pub use bloom::BloomSettings;
pub use gpu::SceneRenderer;
