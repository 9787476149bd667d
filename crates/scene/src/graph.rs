use std::collections::BTreeMap;

use glam::Vec3;
use moonwake_common::{NodeId, Transform};
use serde::{Deserialize, Serialize};

use crate::components::{Light, Renderable};
use crate::water::WaterSurface;

/// A positioned object in the scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
}

/// Hierarchy-free scene graph: named, positioned nodes with component maps
/// held alongside (BTreeMap for deterministic iteration, keyed by node id).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named node and return its id.
    pub fn spawn(&mut self, name: &str, transform: Transform) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(
            id,
            Node {
                name: name.to_string(),
                transform,
            },
        );
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Look up a node id by name. Names are unique by construction in the
    /// built-in scene; first match wins otherwise.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| *id)
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Night-sky cubemap reference: six face image paths in px, nx, py, ny,
/// pz, nz order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkyBox {
    pub faces: [String; 6],
}

/// Camera start pose and lens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraStart {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraStart {
    fn default() -> Self {
        Self {
            eye: Vec3::new(-25.0, 0.0, -50.0),
            target: Vec3::new(0.0, 25.0, 0.0),
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Looping positional background track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundTrack {
    pub path: String,
    pub position: Vec3,
    pub volume: f64,
    pub reference_distance: f32,
}

/// A fully assembled scene: graph, components, and scene-level state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub graph: SceneGraph,
    pub renderables: BTreeMap<NodeId, Renderable>,
    pub lights: BTreeMap<NodeId, Light>,
    pub water: Option<WaterSurface>,
    pub sky: Option<SkyBox>,
    pub music: Option<SoundTrack>,
    /// Passed through to the renderer untouched.
    pub fog_enabled: bool,
    pub debug_grid: bool,
    pub camera: CameraStart,
}

impl Scene {
    /// Advance per-frame scene state (currently just the water clock).
    pub fn advance(&mut self, dt: f32) {
        if let Some(water) = &mut self.water {
            water.advance(dt);
        }
    }

    /// All point lights with their world positions, in deterministic order.
    pub fn point_lights(&self) -> Vec<(Vec3, Vec3, f32, f32)> {
        self.lights
            .iter()
            .filter_map(|(id, light)| match light {
                Light::Point {
                    color,
                    intensity,
                    range,
                } => self
                    .graph
                    .node(*id)
                    .map(|n| (n.transform.position, *color, *intensity, *range)),
                Light::Ambient { .. } => None,
            })
            .collect()
    }

    /// Combined ambient contribution.
    pub fn ambient(&self) -> Vec3 {
        self.lights
            .values()
            .filter_map(|light| match light {
                Light::Ambient { color, intensity } => Some(*color * *intensity),
                Light::Point { .. } => None,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_and_find() {
        let mut graph = SceneGraph::new();
        let id = graph.spawn("moon", Transform::from_position(Vec3::new(250.0, 250.0, 500.0)));
        assert_eq!(graph.find("moon"), Some(id));
        assert_eq!(graph.len(), 1);
        assert!(graph.find("boat").is_none());
    }

    #[test]
    fn node_iteration_is_sorted_by_id() {
        let mut graph = SceneGraph::new();
        for i in 0..50 {
            graph.spawn(&format!("n{i}"), Transform::default());
        }
        let keys: Vec<_> = graph.nodes().keys().copied().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn ambient_sums_only_ambient_lights() {
        let mut scene = Scene::default();
        let a = scene.graph.spawn("ambient", Transform::default());
        let p = scene.graph.spawn("lamp_light", Transform::default());
        scene.lights.insert(
            a,
            Light::Ambient {
                color: Vec3::ONE,
                intensity: 0.1,
            },
        );
        scene.lights.insert(
            p,
            Light::Point {
                color: Vec3::ONE,
                intensity: 50.0,
                range: 60.0,
            },
        );
        assert!((scene.ambient() - Vec3::splat(0.1)).length() < 1e-6);
        assert_eq!(scene.point_lights().len(), 1);
    }
}
