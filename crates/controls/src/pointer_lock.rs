use glam::{Mat4, Vec2, Vec3};

/// First-person camera rig driven by pointer-lock look and the locomotion
/// integrator's displacement output.
///
/// Look direction comes from relative mouse deltas while the pointer is
/// locked. Translation is applied in the yaw plane only: pitch changes where
/// you look, never where the movement keys take you.
#[derive(Debug, Clone, Copy)]
pub struct PointerLockRig {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub sensitivity: f32,
    locked: bool,
}

impl Default for PointerLockRig {
    fn default() -> Self {
        Self {
            position: Vec3::new(-25.0, 0.0, -50.0),
            yaw: 0.0,
            pitch: 0.0,
            sensitivity: 0.002,
            locked: false,
        }
    }
}

impl PointerLockRig {
    /// Rig at `position`, initially facing `target`.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let to = target - position;
        let yaw = to.z.atan2(to.x);
        let planar = (to.x * to.x + to.z * to.z).sqrt();
        let pitch = to.y.atan2(planar);
        Self {
            position,
            yaw,
            pitch,
            ..Self::default()
        }
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Apply a relative pointer motion. Ignored unless locked.
    pub fn look(&mut self, dx: f32, dy: f32) {
        if !self.locked {
            return;
        }
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self
            .pitch
            .clamp(-89.9_f32.to_radians(), 89.9_f32.to_radians());
    }

    /// Full look direction, including pitch.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    /// Apply a local-frame displacement from the integrator: `x` lateral,
    /// `y` along the yaw-plane forward axis. The rig's height never changes.
    pub fn translate(&mut self, displacement: Vec2) {
        let forward = Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin());
        let right = Vec3::new(-self.yaw.sin(), 0.0, self.yaw.cos());
        self.position += right * displacement.x + forward * displacement.y;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_requires_lock() {
        let mut rig = PointerLockRig::default();
        rig.look(100.0, 50.0);
        assert_eq!(rig.yaw, 0.0);
        assert_eq!(rig.pitch, 0.0);

        rig.lock();
        rig.look(100.0, 50.0);
        assert_ne!(rig.yaw, 0.0);
        assert_ne!(rig.pitch, 0.0);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut rig = PointerLockRig::default();
        rig.lock();
        rig.look(0.0, -1.0e6);
        assert!(rig.pitch <= 89.9_f32.to_radians() + 1e-6);
        rig.look(0.0, 1.0e6);
        assert!(rig.pitch >= -89.9_f32.to_radians() - 1e-6);
    }

    #[test]
    fn translation_ignores_pitch() {
        let mut rig = PointerLockRig::default();
        rig.lock();
        rig.look(0.0, -300.0); // look up
        let y_before = rig.position.y;
        rig.translate(Vec2::new(0.0, 5.0));
        assert_eq!(rig.position.y, y_before);
        // Moved in the yaw plane by the requested distance.
        assert!((rig.position.distance(Vec3::new(-25.0, 0.0, -50.0)) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn lateral_translation_is_perpendicular_to_forward() {
        let mut rig = PointerLockRig::default();
        rig.yaw = 0.7;
        let start = rig.position;
        rig.translate(Vec2::new(3.0, 0.0));
        let moved = rig.position - start;
        let forward = Vec3::new(rig.yaw.cos(), 0.0, rig.yaw.sin());
        assert!(moved.dot(forward).abs() < 1e-5);
        assert!((moved.length() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn looking_at_recovers_target_direction() {
        let rig = PointerLockRig::looking_at(Vec3::new(-25.0, 0.0, -50.0), Vec3::new(0.0, 25.0, 0.0));
        let to = (Vec3::new(0.0, 25.0, 0.0) - Vec3::new(-25.0, 0.0, -50.0)).normalize();
        assert!(rig.forward().dot(to) > 0.9999);
    }

    #[test]
    fn view_matrix_is_finite() {
        let rig = PointerLockRig::default();
        let m = rig.view_matrix();
        assert!(m.is_finite());
    }
}
