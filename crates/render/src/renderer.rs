use glam::{Mat4, Vec3};
use moonwake_scene::{Light, MeshSource, Scene};

/// Camera/view configuration for rendering one frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// World-to-view matrix (rigs own the pose; this is their output).
    pub view: Mat4,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(-25.0, 0.0, -50.0),
            view: Mat4::look_at_rh(
                Vec3::new(-25.0, 0.0, -50.0),
                Vec3::new(0.0, 25.0, 0.0),
                Vec3::Y,
            ),
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl RenderView {
    /// Perspective projection for the given surface aspect ratio.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, scene: &Scene, view: &RenderView) -> Self::Output;
}

/// Diagnostic text renderer.
///
/// Produces a human-readable description of the scene. Used by the CLI's
/// `print-scene` and by tests that exercise the render interface without a
/// GPU.
#[derive(Debug, Default)]
pub struct SceneTextRenderer;

impl SceneTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for SceneTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, view: &RenderView) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "=== moonwake scene (nodes={}, fog={}) ===\n",
            scene.graph.len(),
            scene.fog_enabled
        ));
        out.push_str(&format!(
            "Camera: eye=({:.1}, {:.1}, {:.1}) fov={:.0}\n",
            view.eye.x, view.eye.y, view.eye.z, view.fov_degrees
        ));
        if let Some(sky) = &scene.sky {
            out.push_str(&format!("Sky: {}\n", sky.faces[0]));
        }
        if let Some(water) = &scene.water {
            out.push_str(&format!(
                "Water: size={:.0} y={:.1} t={:.2}\n",
                water.size, water.height, water.time
            ));
        }
        if let Some(music) = &scene.music {
            out.push_str(&format!("Music: {}\n", music.path));
        }

        for (id, node) in scene.graph.nodes() {
            let p = node.transform.position;
            let mut tags = Vec::new();
            if let Some(renderable) = scene.renderables.get(id) {
                match &renderable.mesh {
                    MeshSource::Model { path } => tags.push(format!("model:{path}")),
                    MeshSource::Primitive(prim) => tags.push(format!("{prim:?}")),
                }
            }
            if let Some(light) = scene.lights.get(id) {
                match light {
                    Light::Ambient { intensity, .. } => {
                        tags.push(format!("ambient:{intensity}"))
                    }
                    Light::Point { intensity, .. } => tags.push(format!("point:{intensity}")),
                }
            }
            out.push_str(&format!(
                "  {} pos=({:.1}, {:.1}, {:.1}) {}\n",
                node.name,
                p.x,
                p.y,
                p.z,
                tags.join(" ")
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moonwake_scene::{SceneConfig, build_scene};

    #[test]
    fn text_renderer_lists_every_node() {
        let scene = build_scene(&SceneConfig::default());
        let output = SceneTextRenderer::new().render(&scene, &RenderView::default());

        assert!(output.contains("moon"));
        assert!(output.contains("boat"));
        assert!(output.contains("lamp_light"));
        assert!(output.contains("Water:"));
        assert!(output.contains("fov=75"));
    }

    #[test]
    fn disabled_features_disappear_from_output() {
        let scene = build_scene(&SceneConfig {
            water: false,
            audio: false,
            ..SceneConfig::default()
        });
        let output = SceneTextRenderer::new().render(&scene, &RenderView::default());
        assert!(!output.contains("Water:"));
        assert!(!output.contains("Music:"));
    }

    #[test]
    fn projection_is_finite() {
        let view = RenderView::default();
        assert!(view.projection(16.0 / 9.0).is_finite());
    }
}
