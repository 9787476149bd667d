//! Positional background audio.
//!
//! A looping track plays through [kira](https://docs.rs/kira); every frame
//! the listener pose is re-synced from the camera rig and the track's volume
//! and stereo pan are derived from listener↔source distance and bearing.
//! Listener positions are rounded to integer units first.
//!
//! Audio is strictly best-effort: a missing backend or a failed file load is
//! logged and the scene continues in silence.

use std::fmt;
use std::path::Path;

use glam::Vec3;
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use kira::{AudioManager, AudioManagerSettings, Decibels, DefaultBackend, Tween};

/// Errors that can occur in the audio layer.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio backend init failed: {0}")]
    Backend(String),
    #[error("audio load failed: {0}")]
    Load(String),
    #[error("audio play failed: {0}")]
    Play(String),
}

/// Convert a linear amplitude (0.0 = silence, 1.0 = full) to decibels.
fn amplitude_to_db(amplitude: f64) -> Decibels {
    if amplitude <= 0.0 {
        Decibels::SILENCE
    } else {
        Decibels((20.0 * amplitude.log10()) as f32)
    }
}

/// Distance attenuation: `1 / (1 + d / reference)`.
pub fn attenuation(distance: f32, reference_distance: f32) -> f64 {
    1.0 / (1.0 + (distance / reference_distance.max(1e-3)) as f64)
}

/// Stereo pan from listener bearing: −1 hard left, 0 dead ahead, +1 hard
/// right. Vertical offset is ignored; a source directly above the listener
/// is centered.
pub fn stereo_pan(listener: Vec3, listener_right: Vec3, source: Vec3) -> f32 {
    let to = source - listener;
    let planar = Vec3::new(to.x, 0.0, to.z);
    if planar.length_squared() < 1e-6 {
        return 0.0;
    }
    listener_right.dot(planar.normalize()).clamp(-1.0, 1.0)
}

/// Full spatialization step: rounds the listener position to integer units,
/// then derives (volume, pan) for the source.
pub fn spatialize(
    listener: Vec3,
    listener_right: Vec3,
    source: Vec3,
    base_volume: f64,
    reference_distance: f32,
) -> (f64, f32) {
    let listener = listener.round();
    let distance = listener.distance(source);
    let volume = base_volume * attenuation(distance, reference_distance);
    let pan = stereo_pan(listener, listener_right, source);
    (volume, pan)
}

/// Audio engine wrapping kira's manager. `None` inside means the backend
/// could not start and all operations silently no-op.
pub struct AudioEngine {
    manager: Option<AudioManager<DefaultBackend>>,
}

impl fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioEngine")
            .field("enabled", &self.enabled())
            .finish()
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine {
    /// Start the audio backend. Failure degrades to a silent engine.
    pub fn new() -> Self {
        let manager = match AudioManager::<DefaultBackend>::new(AudioManagerSettings::default()) {
            Ok(manager) => Some(manager),
            Err(error) => {
                tracing::warn!(%error, "audio backend unavailable, continuing silent");
                None
            }
        };
        Self { manager }
    }

    /// Engine that never plays anything (for `--no-audio`).
    pub fn disabled() -> Self {
        Self { manager: None }
    }

    pub fn enabled(&self) -> bool {
        self.manager.is_some()
    }

    fn play_looping(&mut self, path: &Path, volume: f64) -> Result<StaticSoundHandle, AudioError> {
        let manager = self
            .manager
            .as_mut()
            .ok_or_else(|| AudioError::Backend("no backend".to_string()))?;
        let data = StaticSoundData::from_file(path)
            .map_err(|e| AudioError::Load(format!("{}: {e}", path.display())))?
            .volume(amplitude_to_db(volume))
            .loop_region(..);
        manager
            .play(data)
            .map_err(|e| AudioError::Play(e.to_string()))
    }
}

/// The scene's looping positional track.
pub struct PositionalTrack {
    source: Vec3,
    base_volume: f64,
    reference_distance: f32,
    handle: Option<StaticSoundHandle>,
}

impl fmt::Debug for PositionalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionalTrack")
            .field("source", &self.source)
            .field("playing", &self.handle.is_some())
            .finish()
    }
}

impl PositionalTrack {
    /// Start the track. A failed load or silent engine yields a track that
    /// updates no-op; the error has already been logged.
    pub fn start(
        engine: &mut AudioEngine,
        path: &Path,
        source: Vec3,
        base_volume: f64,
        reference_distance: f32,
    ) -> Self {
        let handle = if engine.enabled() {
            match engine.play_looping(path, base_volume) {
                Ok(handle) => {
                    tracing::info!(path = %path.display(), "background track playing");
                    Some(handle)
                }
                Err(error) => {
                    tracing::error!(%error, "background track failed to start");
                    None
                }
            }
        } else {
            None
        };
        Self {
            source,
            base_volume,
            reference_distance,
            handle,
        }
    }

    pub fn playing(&self) -> bool {
        self.handle.is_some()
    }

    /// Re-sync the listener pose; volume and pan follow the camera.
    pub fn update_listener(&mut self, position: Vec3, right: Vec3) {
        let Some(handle) = &mut self.handle else {
            return;
        };
        let (volume, pan) = spatialize(
            position,
            right,
            self.source,
            self.base_volume,
            self.reference_distance,
        );
        handle.set_volume(amplitude_to_db(volume), Tween::default());
        handle.set_panning(pan, Tween::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attenuation_decreases_with_distance() {
        let reference = 20.0;
        let mut previous = attenuation(0.0, reference);
        assert!((previous - 1.0).abs() < 1e-9);
        for step in 1..50 {
            let current = attenuation(step as f32 * 5.0, reference);
            assert!(current < previous);
            previous = current;
        }
        assert!(previous > 0.0);
    }

    #[test]
    fn pan_is_centered_dead_ahead() {
        // Listener at origin facing -Z, right = +X... source straight ahead.
        let pan = stereo_pan(Vec3::ZERO, Vec3::X, Vec3::new(0.0, 0.0, -10.0));
        assert_eq!(pan, 0.0);
    }

    #[test]
    fn pan_is_hard_left_and_right_at_ninety_degrees() {
        let right = Vec3::X;
        assert!((stereo_pan(Vec3::ZERO, right, Vec3::new(10.0, 0.0, 0.0)) - 1.0).abs() < 1e-6);
        assert!((stereo_pan(Vec3::ZERO, right, Vec3::new(-10.0, 0.0, 0.0)) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn source_above_the_listener_is_centered() {
        let pan = stereo_pan(Vec3::ZERO, Vec3::X, Vec3::new(0.0, 25.0, 0.0));
        assert_eq!(pan, 0.0);
    }

    #[test]
    fn listener_position_is_rounded() {
        let source = Vec3::new(0.0, 5.0, 0.0);
        let exact = spatialize(Vec3::ZERO, Vec3::X, source, 0.5, 20.0);
        let fractional = spatialize(Vec3::new(0.4, -0.2, 0.3), Vec3::X, source, 0.5, 20.0);
        assert_eq!(exact, fractional);
    }

    #[test]
    fn volume_scales_with_base() {
        let source = Vec3::new(30.0, 0.0, 0.0);
        let (half, _) = spatialize(Vec3::ZERO, Vec3::X, source, 0.5, 20.0);
        let (full, _) = spatialize(Vec3::ZERO, Vec3::X, source, 1.0, 20.0);
        assert!((full - 2.0 * half).abs() < 1e-9);
    }
}
