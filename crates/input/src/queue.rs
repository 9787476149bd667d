use std::collections::VecDeque;

use crate::event::InputEvent;

/// FIFO queue of input events.
///
/// The window boundary pushes events as they arrive; the frame tick drains
/// the queue once, so all input lands at a well-defined point in the loop
/// rather than at arbitrary callback times.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event.
    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// Drain all queued events in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MoveKey;

    #[test]
    fn drains_in_arrival_order() {
        let mut q = InputQueue::new();
        q.push(InputEvent::Move {
            key: MoveKey::Forward,
            pressed: true,
        });
        q.push(InputEvent::PointerDelta { dx: 1.0, dy: 2.0 });
        q.push(InputEvent::Escape);

        let drained: Vec<_> = q.drain().collect();
        assert_eq!(drained.len(), 3);
        assert!(matches!(drained[0], InputEvent::Move { .. }));
        assert!(matches!(drained[1], InputEvent::PointerDelta { .. }));
        assert!(matches!(drained[2], InputEvent::Escape));
    }

    #[test]
    fn drain_empties_the_queue() {
        let mut q = InputQueue::new();
        q.push(InputEvent::Escape);
        assert_eq!(q.len(), 1);
        let _ = q.drain().count();
        assert!(q.is_empty());
        assert_eq!(q.drain().count(), 0);
    }
}
