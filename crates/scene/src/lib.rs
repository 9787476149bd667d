//! Scene model for the moonwake viewer.
//!
//! One configurable scene-setup path: [`SceneConfig`] chooses water, lamp,
//! audio, control scheme, and debug helpers, and [`build_scene`] assembles
//! the graph.
//!
//! # Invariants
//! - Node iteration order is deterministic (BTreeMap).
//! - The scene never owns GPU or audio resources; it references assets by
//!   path and lets the renderer/audio layers resolve them when loaded.

mod components;
mod config;
mod graph;
mod setup;
mod water;

pub use components::{Light, Material, MeshSource, Primitive, Renderable};
pub use config::{ConfigError, ControlScheme, SceneConfig};
pub use graph::{CameraStart, Node, Scene, SceneGraph, SkyBox, SoundTrack};
pub use setup::build_scene;
pub use water::WaterSurface;
