//! Input events mapped to a shared action vocabulary.
//!
//! # Invariants
//! - Raw window events never reach scene or control logic; the app boundary
//!   translates them into [`InputEvent`]s.
//! - Events are queued as they arrive and drained exactly once per frame
//!   tick, in arrival order.

mod event;
mod queue;

pub use event::{InputEvent, MoveKey};
pub use queue::InputQueue;
