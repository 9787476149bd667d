use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Where a renderable's geometry comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MeshSource {
    /// Imported from a model file; the node renders nothing until the
    /// asset's load completes.
    Model { path: String },
    /// Built-in generated primitive, always available.
    Primitive(Primitive),
}

/// Generated geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    /// UV sphere (the moon uses 64 segments around, 32 rings).
    Sphere {
        radius: f32,
        segments: u32,
        rings: u32,
    },
    /// Capped cylinder along +Y.
    Cylinder { radius: f32, height: f32 },
}

/// Surface appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub base_color: Vec3,
    /// Added unattenuated; drives the bloom pass.
    pub emissive: Vec3,
    /// Optional texture path, resolved against the asset directory.
    pub texture: Option<String>,
    /// Unlit surfaces skip the lighting model entirely; the moon is a
    /// textured unlit sphere.
    pub unlit: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec3::new(0.8, 0.8, 0.8),
            emissive: Vec3::ZERO,
            texture: None,
            unlit: false,
        }
    }
}

/// Renderable component: geometry source plus material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Renderable {
    pub mesh: MeshSource,
    pub material: Material,
}

/// Light component. Position comes from the owning node's transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Ambient { color: Vec3, intensity: f32 },
    Point { color: Vec3, intensity: f32, range: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_material_is_lit_and_untextured() {
        let m = Material::default();
        assert!(!m.unlit);
        assert!(m.texture.is_none());
        assert_eq!(m.emissive, Vec3::ZERO);
    }

    #[test]
    fn mesh_source_distinguishes_models_from_primitives() {
        let model = MeshSource::Model {
            path: "models/boat.glb".into(),
        };
        let prim = MeshSource::Primitive(Primitive::Sphere {
            radius: 100.0,
            segments: 64,
            rings: 32,
        });
        assert_ne!(model, prim);
    }
}
