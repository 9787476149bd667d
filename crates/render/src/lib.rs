//! Rendering seam: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - Render state derives from scene state plus a view.
//!
//! The trait is stable across backends: the wgpu implementation lives in
//! `moonwake-render-wgpu`, and [`SceneTextRenderer`] renders the same scene
//! as human-readable text for the CLI and for tests.

mod renderer;

pub use renderer::{RenderView, Renderer, SceneTextRenderer};
