use glam::{Mat4, Vec3};

/// Damped orbit camera rig.
///
/// The camera sits on a sphere around a fixed target. Dragging accumulates
/// angular deltas; every update applies a fraction of the accumulated delta
/// and bleeds the rest off exponentially, so the view glides to rest after
/// the drag ends.
#[derive(Debug, Clone, Copy)]
pub struct OrbitRig {
    pub target: Vec3,
    radius: f32,
    /// Azimuth around +Y, radians.
    theta: f32,
    /// Polar angle from +Y, radians, clamped away from the poles.
    phi: f32,
    delta_theta: f32,
    delta_phi: f32,
    dragging: bool,
    pub rotate_speed: f32,
    pub damping_factor: f32,
    pub min_radius: f32,
    pub max_radius: f32,
}

const POLE_MARGIN: f32 = 0.05;

impl Default for OrbitRig {
    fn default() -> Self {
        // Eye (-25, 0, -50) orbiting the point above the boat at (0, 25, 0).
        Self::from_pose(Vec3::new(-25.0, 0.0, -50.0), Vec3::new(0.0, 25.0, 0.0))
    }
}

impl OrbitRig {
    /// Build a rig from an eye position and orbit target.
    pub fn from_pose(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let radius = offset.length().max(1e-3);
        let theta = offset.z.atan2(offset.x);
        let phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        Self {
            target,
            radius,
            theta,
            phi: phi.clamp(POLE_MARGIN, std::f32::consts::PI - POLE_MARGIN),
            delta_theta: 0.0,
            delta_phi: 0.0,
            dragging: false,
            rotate_speed: 0.005,
            damping_factor: 0.05,
            min_radius: 5.0,
            max_radius: 500.0,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn dragging(&self) -> bool {
        self.dragging
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Accumulate pointer motion into the pending angular delta. Ignored
    /// unless a drag is active.
    pub fn pointer_delta(&mut self, dx: f32, dy: f32) {
        if !self.dragging {
            return;
        }
        self.delta_theta += dx * self.rotate_speed;
        self.delta_phi += dy * self.rotate_speed;
    }

    /// Dolly in (positive ticks) or out along the view ray.
    pub fn zoom(&mut self, ticks: f32) {
        self.radius = (self.radius * 0.95_f32.powf(ticks)).clamp(self.min_radius, self.max_radius);
    }

    /// Pending angular momentum (for tests and diagnostics).
    pub fn angular_momentum(&self) -> f32 {
        (self.delta_theta * self.delta_theta + self.delta_phi * self.delta_phi).sqrt()
    }

    /// Advance one frame: apply a damped fraction of the pending delta and
    /// decay the remainder. `dt` keeps the decay frame-rate independent.
    pub fn update(&mut self, dt: f32) {
        // The damping factor is defined per 60 Hz frame; scale the applied
        // fraction by dt so slower frames catch up.
        let blend = (self.damping_factor * dt * 60.0).min(1.0);
        self.theta += self.delta_theta * blend;
        self.phi = (self.phi + self.delta_phi * blend)
            .clamp(POLE_MARGIN, std::f32::consts::PI - POLE_MARGIN);
        self.delta_theta *= 1.0 - blend;
        self.delta_phi *= 1.0 - blend;
    }

    /// Camera position on the orbit sphere.
    pub fn eye(&self) -> Vec3 {
        self.target
            + self.radius
                * Vec3::new(
                    self.phi.sin() * self.theta.cos(),
                    self.phi.cos(),
                    self.phi.sin() * self.theta.sin(),
                )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn from_pose_round_trips_eye() {
        let eye = Vec3::new(-25.0, 0.0, -50.0);
        let target = Vec3::new(0.0, 25.0, 0.0);
        let rig = OrbitRig::from_pose(eye, target);
        assert!(rig.eye().distance(eye) < 1e-3);
    }

    #[test]
    fn drag_gates_pointer_input() {
        let mut rig = OrbitRig::default();
        rig.pointer_delta(50.0, 0.0);
        assert_eq!(rig.angular_momentum(), 0.0);

        rig.begin_drag();
        rig.pointer_delta(50.0, 0.0);
        assert!(rig.angular_momentum() > 0.0);
    }

    #[test]
    fn momentum_decays_after_release() {
        let mut rig = OrbitRig::default();
        rig.begin_drag();
        rig.pointer_delta(200.0, 80.0);
        rig.end_drag();

        let mut previous = rig.angular_momentum();
        assert!(previous > 0.0);
        for _ in 0..240 {
            rig.update(DT);
            let current = rig.angular_momentum();
            assert!(current < previous);
            previous = current;
        }
        assert!(previous < 1e-3);
    }

    #[test]
    fn polar_angle_stays_off_the_poles() {
        let mut rig = OrbitRig::default();
        rig.begin_drag();
        rig.pointer_delta(0.0, 1.0e6);
        for _ in 0..300 {
            rig.update(DT);
        }
        assert!(rig.phi < std::f32::consts::PI);
        assert!(rig.phi >= POLE_MARGIN - 1e-6);
        assert!(rig.phi <= std::f32::consts::PI - POLE_MARGIN + 1e-6);
    }

    #[test]
    fn zoom_clamps_radius() {
        let mut rig = OrbitRig::default();
        rig.zoom(1.0e4);
        assert_eq!(rig.radius(), rig.min_radius);
        rig.zoom(-1.0e4);
        assert_eq!(rig.radius(), rig.max_radius);
    }

    #[test]
    fn orbit_preserves_distance_to_target() {
        let mut rig = OrbitRig::default();
        let before = rig.eye().distance(rig.target);
        rig.begin_drag();
        rig.pointer_delta(123.0, -45.0);
        for _ in 0..60 {
            rig.update(DT);
        }
        let after = rig.eye().distance(rig.target);
        assert!((before - after).abs() < 1e-3);
    }
}
