use std::f32::consts::FRAC_PI_4;

use glam::{Quat, Vec3};
use moonwake_common::{Transform, rgb};

use crate::components::{Light, Material, MeshSource, Primitive, Renderable};
use crate::config::SceneConfig;
use crate::graph::{Scene, SkyBox, SoundTrack};
use crate::water::WaterSurface;

/// Assemble the night-ocean scene from a configuration.
///
/// Camera starts at (−25, 0, −50) looking at (0, 25, 0); white ambient at
/// 0.1; a radius-100 moon at (250, 250, 500) tinted 0xfff7b3; the boat at
/// the origin, scaled to 0.1 and yawed −π/4; water at y = −10.
pub fn build_scene(config: &SceneConfig) -> Scene {
    let mut scene = Scene {
        fog_enabled: config.fog,
        debug_grid: config.debug_grid,
        ..Scene::default()
    };

    let ambient = scene.graph.spawn("ambient", Transform::default());
    scene.lights.insert(
        ambient,
        Light::Ambient {
            color: Vec3::ONE,
            intensity: 0.1,
        },
    );

    scene.sky = Some(SkyBox {
        faces: ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"]
            .map(|face| format!("{}/{}", config.sky_dir, face)),
    });

    let moon = scene.graph.spawn(
        "moon",
        Transform::from_position(Vec3::new(250.0, 250.0, 500.0)),
    );
    scene.renderables.insert(
        moon,
        Renderable {
            mesh: MeshSource::Primitive(Primitive::Sphere {
                radius: 100.0,
                segments: 64,
                rings: 32,
            }),
            material: Material {
                base_color: rgb(0xfff7b3),
                emissive: rgb(0xfff7b3),
                texture: config.moon_texture.clone(),
                unlit: true,
            },
        },
    );

    let boat = scene.graph.spawn(
        "boat",
        Transform {
            position: Vec3::ZERO,
            rotation: Quat::from_rotation_y(-FRAC_PI_4),
            scale: Vec3::splat(0.1),
        },
    );
    scene.renderables.insert(
        boat,
        Renderable {
            mesh: MeshSource::Model {
                path: config.boat_model.clone(),
            },
            material: Material::default(),
        },
    );

    if config.lamp {
        build_lamp(&mut scene, config);
    }

    if config.water {
        scene.water = Some(WaterSurface {
            normal_map: config.water_normals.clone(),
            ..WaterSurface::default()
        });
    }

    if config.audio {
        scene.music = Some(SoundTrack {
            path: config.music.clone(),
            position: Vec3::new(0.0, 5.0, 0.0),
            volume: 0.5,
            reference_distance: 20.0,
        });
    }

    tracing::info!(
        nodes = scene.graph.len(),
        water = scene.water.is_some(),
        lamp = config.lamp,
        "scene assembled"
    );
    scene
}

/// Street lamp beside the boat: either the configured model, or a built-in
/// fixture (pole + emissive head) so the point light has a visible source.
fn build_lamp(scene: &mut Scene, config: &SceneConfig) {
    let base = Vec3::new(12.0, -10.0, 8.0);
    let head = base + Vec3::new(0.0, 13.0, 0.0);

    match &config.lamp_model {
        Some(path) => {
            let lamp = scene.graph.spawn("lamp", Transform::from_position(base));
            scene.renderables.insert(
                lamp,
                Renderable {
                    mesh: MeshSource::Model { path: path.clone() },
                    material: Material::default(),
                },
            );
        }
        None => {
            let pole = scene.graph.spawn(
                "lamp_pole",
                Transform::from_position(base + Vec3::new(0.0, 6.0, 0.0)),
            );
            scene.renderables.insert(
                pole,
                Renderable {
                    mesh: MeshSource::Primitive(Primitive::Cylinder {
                        radius: 0.25,
                        height: 12.0,
                    }),
                    material: Material {
                        base_color: Vec3::splat(0.15),
                        ..Material::default()
                    },
                },
            );

            let head_node = scene
                .graph
                .spawn("lamp_head", Transform::from_position(head));
            scene.renderables.insert(
                head_node,
                Renderable {
                    mesh: MeshSource::Primitive(Primitive::Sphere {
                        radius: 0.8,
                        segments: 32,
                        rings: 16,
                    }),
                    material: Material {
                        base_color: rgb(0xffaa55),
                        emissive: rgb(0xffaa55) * 2.0,
                        texture: None,
                        unlit: true,
                    },
                },
            );
        }
    }

    let light = scene
        .graph
        .spawn("lamp_light", Transform::from_position(head));
    scene.lights.insert(
        light,
        Light::Point {
            color: rgb(0xffaa55),
            intensity: 60.0,
            range: 80.0,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlScheme;

    #[test]
    fn full_scene_has_all_features() {
        let scene = build_scene(&SceneConfig::default());
        assert!(scene.graph.find("moon").is_some());
        assert!(scene.graph.find("boat").is_some());
        assert!(scene.graph.find("lamp_light").is_some());
        assert!(scene.water.is_some());
        assert!(scene.sky.is_some());
        assert!(scene.music.is_some());
        assert_eq!(scene.point_lights().len(), 1);
    }

    #[test]
    fn toggles_remove_features() {
        let config = SceneConfig {
            water: false,
            lamp: false,
            audio: false,
            ..SceneConfig::default()
        };
        let scene = build_scene(&config);
        assert!(scene.water.is_none());
        assert!(scene.music.is_none());
        assert!(scene.graph.find("lamp_light").is_none());
        assert!(scene.graph.find("lamp_pole").is_none());
        assert!(scene.point_lights().is_empty());
        // The moon and boat are always present.
        assert!(scene.graph.find("moon").is_some());
        assert!(scene.graph.find("boat").is_some());
    }

    #[test]
    fn demo_constants_are_preserved() {
        let scene = build_scene(&SceneConfig::default());

        let moon = scene.graph.find("moon").unwrap();
        let node = scene.graph.node(moon).unwrap();
        assert_eq!(node.transform.position, Vec3::new(250.0, 250.0, 500.0));
        match &scene.renderables[&moon].mesh {
            MeshSource::Primitive(Primitive::Sphere { radius, .. }) => {
                assert_eq!(*radius, 100.0)
            }
            other => panic!("moon should be a sphere, got {other:?}"),
        }

        let boat = scene.graph.find("boat").unwrap();
        let node = scene.graph.node(boat).unwrap();
        assert_eq!(node.transform.scale, Vec3::splat(0.1));

        assert_eq!(scene.camera.fov_degrees, 75.0);
        assert_eq!(scene.camera.eye, Vec3::new(-25.0, 0.0, -50.0));
        assert!((scene.ambient() - Vec3::splat(0.1)).length() < 1e-6);
    }

    #[test]
    fn fog_flag_passes_through() {
        let scene = build_scene(&SceneConfig {
            fog: true,
            ..SceneConfig::default()
        });
        assert!(scene.fog_enabled);
        let scene = build_scene(&SceneConfig::default());
        assert!(!scene.fog_enabled);
    }

    #[test]
    fn lamp_model_replaces_the_primitive_fixture() {
        let config = SceneConfig {
            lamp_model: Some("models/lamp.glb".to_string()),
            ..SceneConfig::default()
        };
        let scene = build_scene(&config);
        assert!(scene.graph.find("lamp").is_some());
        assert!(scene.graph.find("lamp_pole").is_none());
        // The point light is present either way.
        assert!(scene.graph.find("lamp_light").is_some());
    }

    #[test]
    fn control_scheme_is_config_only() {
        // The builder does not embed the control scheme in the scene; rigs
        // are the app's concern. This simply pins the config default.
        assert_eq!(SceneConfig::default().controls, ControlScheme::Orbit);
    }
}
