use glam::Vec3;
use moonwake_common::rgb;
use serde::{Deserialize, Serialize};

/// Animated water surface state.
///
/// The geometry is a large plane; all animation happens in the shader,
/// driven by the accumulated `time` uniform advanced once per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterSurface {
    /// Plane edge length, world units.
    pub size: f32,
    /// Water level on the y axis.
    pub height: f32,
    /// Deep-water base color (0x000563).
    pub deep_color: Vec3,
    /// Scale applied to the normal-map distortion.
    pub distortion_scale: f32,
    /// Normal-map image path, resolved against the asset directory.
    pub normal_map: String,
    /// Accumulated animation time, seconds.
    pub time: f32,
}

impl Default for WaterSurface {
    fn default() -> Self {
        Self {
            size: 2000.0,
            height: -10.0,
            deep_color: rgb(0x000563),
            distortion_scale: 3.7,
            normal_map: "textures/ocean/normal.png".to_string(),
            time: 0.0,
        }
    }
}

impl WaterSurface {
    /// Advance the animation clock by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.time += dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_accumulates_monotonically() {
        let mut water = WaterSurface::default();
        assert_eq!(water.time, 0.0);
        water.advance(1.0 / 60.0);
        water.advance(1.0 / 60.0);
        assert!((water.time - 2.0 / 60.0).abs() < 1e-6);
        let before = water.time;
        water.advance(0.0);
        assert_eq!(water.time, before);
    }

    #[test]
    fn defaults_match_the_demo_palette() {
        let water = WaterSurface::default();
        assert_eq!(water.height, -10.0);
        assert_eq!(water.deep_color, rgb(0x000563));
    }
}
