/// One of the four directional movement keys.
///
/// Both WASD and the arrow keys map here, so holding either produces the
/// same intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKey {
    Forward,
    Backward,
    Left,
    Right,
}

/// A translated input event, produced at the window boundary and consumed
/// by the frame tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A movement key changed state.
    Move { key: MoveKey, pressed: bool },
    /// Relative pointer motion, in device counts.
    PointerDelta { dx: f32, dy: f32 },
    /// The primary pointer button changed state.
    PointerButton { pressed: bool },
    /// Scroll wheel motion, in line ticks (positive = zoom in).
    Zoom { ticks: f32 },
    /// Escape was pressed (releases pointer lock / clears drag).
    Escape,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_event_carries_key_state() {
        let e = InputEvent::Move {
            key: MoveKey::Forward,
            pressed: true,
        };
        assert!(matches!(
            e,
            InputEvent::Move {
                key: MoveKey::Forward,
                pressed: true
            }
        ));
    }
}
