use glam::Vec2;

use crate::intent::MoveIntent;

/// Exponential damping applied to velocity every frame, per second.
pub const DAMPING: f32 = 10.0;

/// Acceleration applied while a directional key is held, units/s².
pub const ACCEL: f32 = 40.0;

/// First-person locomotion integrator.
///
/// Converts discrete key intent into smooth camera-relative translation.
/// Velocity lives in the rig's local plane: `x` lateral, `y` forward axis.
/// While a key is held the matching axis accelerates (negative internally;
/// the returned displacement negates it back, so holding forward moves
/// forward). Absent input, each axis decays exponentially toward zero and
/// the rig glides to rest within a few hundred milliseconds.
///
/// Steady state under a single held key is `ACCEL / DAMPING` units/s.
#[derive(Debug, Default, Clone, Copy)]
pub struct Locomotion {
    velocity: Vec2,
}

impl Locomotion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current velocity (local frame, pre-negation).
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Drop all momentum (used when the pointer lock is released).
    pub fn reset(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    /// Advance one frame and return the local-frame displacement to apply:
    /// `x` lateral, `y` forward. `dt` is measured wall-clock seconds.
    pub fn step(&mut self, intent: &MoveIntent, dt: f32) -> Vec2 {
        self.velocity -= self.velocity * DAMPING * dt;

        let dir = intent.direction();
        if intent.forward || intent.backward {
            self.velocity.y -= dir.y * ACCEL * dt;
        }
        if intent.left || intent.right {
            self.velocity.x -= dir.x * ACCEL * dt;
        }

        Vec2::new(-self.velocity.x * dt, -self.velocity.y * dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moonwake_input::MoveKey;

    const DT: f32 = 1.0 / 60.0;

    fn held(key: MoveKey) -> MoveIntent {
        let mut intent = MoveIntent::default();
        intent.set(key, true);
        intent
    }

    #[test]
    fn damping_strictly_decreases_speed_without_input() {
        let mut loco = Locomotion::new();
        // Build up some speed first.
        let intent = held(MoveKey::Forward);
        for _ in 0..30 {
            loco.step(&intent, DT);
        }

        let idle = MoveIntent::default();
        let mut previous = loco.velocity().length();
        assert!(previous > 0.0);
        for _ in 0..120 {
            loco.step(&idle, DT);
            let current = loco.velocity().length();
            assert!(current < previous, "speed must decay every frame");
            previous = current;
        }
        assert!(previous < 1e-3);
    }

    #[test]
    fn forward_converges_to_steady_state() {
        let mut loco = Locomotion::new();
        let intent = held(MoveKey::Forward);
        // Ten simulated seconds at 60 Hz is far past the settling time.
        for _ in 0..600 {
            loco.step(&intent, DT);
        }
        let steady = ACCEL / DAMPING;
        assert!((loco.velocity().y + steady).abs() < 1e-3);
        assert!((loco.velocity().length() - steady).abs() < 1e-3);
    }

    #[test]
    fn release_decays_below_one_percent_within_a_second() {
        let mut loco = Locomotion::new();
        let intent = held(MoveKey::Forward);
        for _ in 0..600 {
            loco.step(&intent, DT);
        }
        let steady = loco.velocity().length();

        let idle = MoveIntent::default();
        for _ in 0..60 {
            loco.step(&idle, DT);
        }
        assert!(loco.velocity().length() < steady * 0.01);
    }

    #[test]
    fn left_and_right_are_symmetric() {
        let mut left = Locomotion::new();
        let mut right = Locomotion::new();
        let mut lateral_left = 0.0;
        let mut lateral_right = 0.0;
        for _ in 0..90 {
            lateral_left += left.step(&held(MoveKey::Left), DT).x;
            lateral_right += right.step(&held(MoveKey::Right), DT).x;
        }
        assert!(lateral_left < 0.0);
        assert!(lateral_right > 0.0);
        assert!((lateral_left + lateral_right).abs() < 1e-5);
    }

    #[test]
    fn forward_displacement_is_positive_along_forward_axis() {
        let mut loco = Locomotion::new();
        let mut total = 0.0;
        for _ in 0..60 {
            total += loco.step(&held(MoveKey::Forward), DT).y;
        }
        assert!(total > 0.0);
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let mut loco = Locomotion::new();
        let intent = held(MoveKey::Forward);
        for _ in 0..10 {
            loco.step(&intent, DT);
        }
        let before = loco.velocity();
        let disp = loco.step(&intent, 0.0);
        assert_eq!(disp, Vec2::ZERO);
        assert_eq!(loco.velocity(), before);
    }

    #[test]
    fn motion_is_frame_rate_independent_at_rest_decay() {
        // Two different frame rates must both end near rest after one second.
        let mut a = Locomotion::new();
        let mut b = Locomotion::new();
        let intent = held(MoveKey::Forward);
        for _ in 0..120 {
            a.step(&intent, 1.0 / 120.0);
        }
        for _ in 0..30 {
            b.step(&intent, 1.0 / 30.0);
        }
        let idle = MoveIntent::default();
        for _ in 0..120 {
            a.step(&idle, 1.0 / 120.0);
        }
        for _ in 0..30 {
            b.step(&idle, 1.0 / 30.0);
        }
        assert!(a.velocity().length() < 0.05);
        assert!(b.velocity().length() < 0.05);
    }
}
