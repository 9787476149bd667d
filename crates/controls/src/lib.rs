//! Camera control rigs for the moonwake viewer.
//!
//! Two schemes, selected by scene configuration:
//! - [`PointerLockRig`]: first-person look + the velocity-damping
//!   locomotion integrator ([`Locomotion`]).
//! - [`OrbitRig`]: damped orbit around a fixed target.
//!
//! # Invariants
//! - Rig motion is frame-rate independent (everything scales by measured
//!   delta time).
//! - Rigs never read window events directly; they consume translated
//!   [`moonwake_input`] events and per-frame updates.

mod integrator;
mod intent;
mod orbit;
mod pointer_lock;

pub use integrator::{ACCEL, DAMPING, Locomotion};
pub use intent::MoveIntent;
pub use orbit::OrbitRig;
pub use pointer_lock::PointerLockRig;
