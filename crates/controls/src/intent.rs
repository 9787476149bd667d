use glam::Vec2;
use moonwake_input::MoveKey;

/// Current movement intent: one boolean per directional key.
///
/// Set on key-down, cleared on key-up. The direction derived from it is
/// recomputed fresh every frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MoveIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveIntent {
    /// Apply a key state change.
    pub fn set(&mut self, key: MoveKey, pressed: bool) {
        match key {
            MoveKey::Forward => self.forward = pressed,
            MoveKey::Backward => self.backward = pressed,
            MoveKey::Left => self.left = pressed,
            MoveKey::Right => self.right = pressed,
        }
    }

    /// Clear all held keys (used when pointer lock is released, so keys
    /// released outside the lock cannot stick).
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True if any directional key is held.
    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    /// Raw intent direction in the rig's local plane.
    ///
    /// `x` is the lateral axis (`right − left`), `y` the forward axis
    /// (`forward − backward`). Normalized to unit length; the zero vector
    /// stays zero (`normalize_or_zero`), so diagonal movement is never
    /// faster than straight movement and no division by zero can occur.
    pub fn direction(&self) -> Vec2 {
        let x = (self.right as i8 - self.left as i8) as f32;
        let y = (self.forward as i8 - self.backward as i8) as f32;
        Vec2::new(x, y).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_unit_or_zero() {
        let mut intent = MoveIntent::default();
        assert_eq!(intent.direction(), Vec2::ZERO);

        intent.set(MoveKey::Forward, true);
        assert!((intent.direction().length() - 1.0).abs() < 1e-6);

        intent.set(MoveKey::Right, true);
        assert!((intent.direction().length() - 1.0).abs() < 1e-6);

        // Opposed keys cancel back to exactly zero.
        intent.set(MoveKey::Right, false);
        intent.set(MoveKey::Backward, true);
        assert_eq!(intent.direction(), Vec2::ZERO);
    }

    #[test]
    fn direction_is_idempotent() {
        let mut intent = MoveIntent::default();
        intent.set(MoveKey::Forward, true);
        intent.set(MoveKey::Left, true);
        let first = intent.direction();
        let second = intent.direction();
        assert_eq!(first, second);
    }

    #[test]
    fn key_up_clears_intent() {
        let mut intent = MoveIntent::default();
        intent.set(MoveKey::Left, true);
        assert!(intent.any());
        intent.set(MoveKey::Left, false);
        assert!(!intent.any());
    }

    #[test]
    fn clear_releases_everything() {
        let mut intent = MoveIntent::default();
        intent.set(MoveKey::Forward, true);
        intent.set(MoveKey::Right, true);
        intent.clear();
        assert_eq!(intent, MoveIntent::default());
    }
}
