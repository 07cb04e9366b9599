//! Chord Arena - bounded-arena bounce simulation driving chords and effects
//!
//! Core modules:
//! - `sim`: Deterministic simulation (boundaries, bodies, collisions, sequencing)
//! - `settings`: Data-driven configuration and per-variant presets
//! - `score`: Builds the ordered note sequence the sequencer consumes
//! - `audio`: The audio collaborator interface (chords and effects)
//! - `snapshot`: Read-only render views of the simulation

pub mod audio;
pub mod error;
pub mod score;
pub mod settings;
pub mod sim;
pub mod snapshot;

pub use audio::{AudioCall, AudioLog, AudioSink, Silence, SoundEffect};
pub use error::{ArenaError, Result};
pub use score::{NoteEvent, Score};
pub use settings::{Settings, Variant};
pub use snapshot::ArenaSnapshot;

use glam::Vec2;
use std::f32::consts::TAU;

/// Engine configuration constants
pub mod consts {
    /// Nominal frame rate the presets were tuned at
    pub const FRAME_RATE: f64 = 100.0;
    /// Real seconds elapsed per tick at the nominal frame rate
    pub const FRAME_DT: f64 = 1.0 / FRAME_RATE;

    /// Portrait canvas used by the freeze, pulse and ring-race variants
    pub const PORTRAIT_WIDTH: f32 = 1080.0;
    pub const PORTRAIT_HEIGHT: f32 = 1920.0;
    /// Square canvas used by the rotation variant
    pub const SQUARE_SIZE: f32 = 1920.0;

    /// Two note onsets closer than this (seconds) belong to the same chord
    pub const CHORD_EPSILON: f64 = 1e-3;
}

/// Normalize an angle to [0, 2π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Angle of `offset` measured counter-clockwise on screen.
///
/// Screen space has y pointing down, so the vertical axis is inverted before
/// `atan2`. The result is normalized to [0, 2π).
#[inline]
pub fn screen_angle(offset: Vec2) -> f32 {
    normalize_angle((-offset.y).atan2(offset.x))
}

/// Convert polar (r, theta) to a cartesian offset
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-5);
        assert!((normalize_angle(TAU + 0.25) - 0.25).abs() < 1e-5);
        assert_eq!(normalize_angle(0.0), 0.0);
        assert!(normalize_angle(-1e-9) < TAU);
    }

    #[test]
    fn test_screen_angle_inverts_vertical_axis() {
        // Straight up on screen is negative y
        assert!((screen_angle(Vec2::new(0.0, -10.0)) - FRAC_PI_2).abs() < 1e-5);
        assert!((screen_angle(Vec2::new(0.0, 10.0)) - 3.0 * FRAC_PI_2).abs() < 1e-5);
        assert!((screen_angle(Vec2::new(-5.0, 0.0)) - PI).abs() < 1e-5);
        assert_eq!(screen_angle(Vec2::new(5.0, 0.0)), 0.0);
    }
}
