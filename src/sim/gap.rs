//! Angular gap geometry for boundaries
//!
//! A gap is an opening on a circle, defined by:
//! - center: angle of the middle of the opening
//! - half_width: half the angular width of the opening
//!
//! Angles use the screen convention from [`crate::screen_angle`] and are
//! normalized to [0, 2π). The solid wall is always the exact complement of the
//! gap, so a body is either "in the gap" or "on the wall", never both.

use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use crate::normalize_angle;

/// An angular opening on a circular boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapGeometry {
    /// Center angle of the opening (radians, [0, 2π))
    pub center: f32,
    /// Half of the angular width (radians). Zero or less means "no gap".
    pub half_width: f32,
}

impl Default for GapGeometry {
    fn default() -> Self {
        Self::none()
    }
}

impl GapGeometry {
    /// Gap centered at `center` spanning `width` radians in total
    pub fn new(center: f32, width: f32) -> Self {
        Self {
            center: normalize_angle(center),
            half_width: width / 2.0,
        }
    }

    /// A closed circle: nothing passes through
    pub fn none() -> Self {
        Self {
            center: 0.0,
            half_width: 0.0,
        }
    }

    /// True if the gap has any opening at all
    #[inline]
    pub fn is_open(&self) -> bool {
        self.half_width > 0.0
    }

    /// True if the opening covers the whole circle
    #[inline]
    pub fn is_full(&self) -> bool {
        self.half_width >= PI
    }

    /// Start angle of the opening, (center - half) mod 2π
    #[inline]
    pub fn start(&self) -> f32 {
        normalize_angle(self.center - self.half_width)
    }

    /// End angle of the opening, (center + half) mod 2π
    #[inline]
    pub fn end(&self) -> f32 {
        normalize_angle(self.center + self.half_width)
    }

    /// (start, end) of the opening. `start > end` means it wraps across 0.
    /// A degenerate opening whose ends round to the same angle is a single
    /// point, never the whole circle.
    pub fn interval(&self) -> Option<(f32, f32)> {
        self.is_open().then(|| (self.start(), self.end()))
    }

    /// Advance the gap center by `delta` radians
    pub fn rotate(&mut self, delta: f32) {
        self.center = normalize_angle(self.center + delta);
    }

    /// Check if an angle falls inside the opening
    pub fn contains(&self, angle: f32) -> bool {
        if !self.is_open() {
            return false;
        }
        if self.is_full() {
            return true;
        }

        let theta = normalize_angle(angle);
        let start = self.start();
        let end = self.end();

        if start <= end {
            theta >= start && theta <= end
        } else {
            // Wraparound case (e.g. start=350°, end=10°)
            theta >= start || theta <= end
        }
    }

    /// The solid wall as one or two arcs, complementary to the opening.
    ///
    /// Non-wrapped openings leave `(end, 2π)` and `[0, start)`; a wrapped
    /// opening leaves the single arc `(end, start)`.
    pub fn solid_arcs(&self) -> Vec<SolidArc> {
        if !self.is_open() {
            return vec![SolidArc::full()];
        }
        if self.is_full() {
            return Vec::new();
        }

        let start = self.start();
        let end = self.end();

        if start <= end {
            let mut arcs = Vec::with_capacity(2);
            if end < TAU {
                arcs.push(SolidArc {
                    start: end,
                    end: TAU,
                    closed_start: false,
                });
            }
            if start > 0.0 {
                arcs.push(SolidArc {
                    start: 0.0,
                    end: start,
                    closed_start: true,
                });
            }
            arcs
        } else {
            vec![SolidArc {
                start: end,
                end: start,
                closed_start: false,
            }]
        }
    }

    /// Check if an angle falls on the solid wall
    pub fn on_wall(&self, angle: f32) -> bool {
        let theta = normalize_angle(angle);
        self.solid_arcs().iter().any(|arc| arc.contains(theta))
    }
}

/// One drawable/collidable piece of a boundary, `start < end` in [0, 2π]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolidArc {
    pub start: f32,
    pub end: f32,
    /// Whether `start` itself belongs to the arc (only true for the piece
    /// beginning at angle 0, since the opening's own edges are closed)
    pub closed_start: bool,
}

impl SolidArc {
    /// The whole circle
    pub fn full() -> Self {
        Self {
            start: 0.0,
            end: TAU,
            closed_start: true,
        }
    }

    /// Angular span of the arc
    #[inline]
    pub fn angular_span(&self) -> f32 {
        self.end - self.start
    }

    /// Check if a normalized angle lies on this arc
    pub fn contains(&self, theta: f32) -> bool {
        let after_start = if self.closed_start {
            theta >= self.start
        } else {
            theta > self.start
        };
        after_start && theta < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_gap_contains_no_wrap() {
        let gap = GapGeometry::new(FRAC_PI_2, 0.5);
        assert!(gap.contains(FRAC_PI_2));
        assert!(gap.contains(FRAC_PI_2 + 0.24));
        assert!(!gap.contains(FRAC_PI_2 + 0.3));
        assert!(!gap.contains(0.0));
    }

    #[test]
    fn test_gap_contains_wraparound() {
        // Opening from 350° to 10°
        let gap = GapGeometry::new(0.0, 20.0_f32.to_radians());
        assert!(gap.start() > gap.end());
        assert!(gap.contains(0.0));
        assert!(gap.contains(355.0_f32.to_radians()));
        assert!(gap.contains(5.0_f32.to_radians()));
        assert!(gap.contains(-5.0_f32.to_radians()));
        assert!(!gap.contains(PI));
    }

    #[test]
    fn test_zero_width_gap_is_closed() {
        let gap = GapGeometry::new(0.0, 0.0);
        assert!(!gap.is_open());
        for i in 0..64 {
            assert!(!gap.contains(i as f32 * TAU / 64.0));
        }
        assert_eq!(gap.solid_arcs(), vec![SolidArc::full()]);
        assert_eq!(gap.interval(), None);
    }

    #[test]
    fn test_full_gap_has_no_wall() {
        let gap = GapGeometry::new(1.0, TAU);
        assert!(gap.contains(3.0));
        assert!(gap.solid_arcs().is_empty());
        assert!(!gap.on_wall(3.0));
    }

    #[test]
    fn test_solid_arcs_split_when_not_wrapped() {
        let gap = GapGeometry::new(PI / 1.2, PI / 4.0);
        let arcs = gap.solid_arcs();
        assert_eq!(arcs.len(), 2);
        assert!((arcs[0].start - gap.end()).abs() < 1e-6);
        assert_eq!(arcs[0].end, TAU);
        assert_eq!(arcs[1].start, 0.0);
        assert!((arcs[1].end - gap.start()).abs() < 1e-6);
        // Angle zero is solid wall, not opening
        assert!(gap.on_wall(0.0));
        assert!(!gap.contains(0.0));
    }

    #[test]
    fn test_solid_arc_single_when_wrapped() {
        let gap = GapGeometry::new(0.1, 0.6);
        let arcs = gap.solid_arcs();
        assert_eq!(arcs.len(), 1);
        assert!((arcs[0].start - gap.end()).abs() < 1e-6);
        assert!((arcs[0].end - gap.start()).abs() < 1e-6);
        assert!((arcs[0].angular_span() - (TAU - 0.6)).abs() < 1e-4);
    }

    #[test]
    fn test_gap_edges_belong_to_opening() {
        let gap = GapGeometry::new(1.0, 0.5);
        let (start, end) = gap.interval().unwrap();
        assert!(gap.contains(start) && !gap.on_wall(start));
        assert!(gap.contains(end) && !gap.on_wall(end));
    }

    #[test]
    fn test_rotate_wraps() {
        let mut gap = GapGeometry::new(TAU - 0.05, 0.2);
        gap.rotate(0.1);
        assert!((gap.center - 0.05).abs() < 1e-5);
    }
}
