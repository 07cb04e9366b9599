//! Circular walls
//!
//! A boundary is one circle (optionally with a gap) that bodies live inside.
//! It can rotate its gap, ride on a damped spring that recoils from bounces,
//! and, for ring fields, be destroyed when a body passes its gap.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use super::body::Body;
use super::collision::{CollisionEvent, ContactKind, bounce_off_wall, wall_contact};
use super::gap::{GapGeometry, SolidArc};
use crate::settings::{MinBounce, SpringSettings};

/// How the color phase of a boundary evolves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColorCycle {
    /// Rainbow drift: phase advances by `speed` every tick
    Linear { speed: f32 },
    /// Phase follows `(sin(2π t / period + offset) + 1) / 2` on the engine clock
    Oscillate { period: f64, offset: f64 },
}

/// Damped spring pulling the boundary center back to rest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub rest: Vec2,
    pub velocity: Vec2,
    pub stiffness: f32,
    pub damping: f32,
    /// Impulse applied along the contact normal on every bounce
    pub shock_force: f32,
}

impl Spring {
    pub fn new(rest: Vec2, settings: &SpringSettings) -> Self {
        Self {
            rest,
            velocity: Vec2::ZERO,
            stiffness: settings.stiffness,
            damping: settings.damping,
            shock_force: settings.shock_force,
        }
    }

    /// One spring-damper step, moving `center`
    pub fn step(&mut self, center: &mut Vec2) {
        self.velocity += (self.rest - *center) * self.stiffness;
        self.velocity *= self.damping;
        *center += self.velocity;
    }

    pub fn shock(&mut self, normal: Vec2) {
        self.velocity += normal * self.shock_force;
    }
}

/// Outcome of testing one body against one boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryContact {
    /// The body is inside and not touching
    Clear,
    /// The body reached the wall inside the gap
    Escaped { angle: f32 },
    /// The body hit the solid wall and was reflected
    Bounced(CollisionEvent),
}

/// A circular wall
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boundary {
    pub id: u32,
    pub center: Vec2,
    pub radius: f32,
    pub stroke_width: f32,
    pub gap: GapGeometry,
    /// Gap rotation per tick (radians)
    pub rotation_rate: f32,
    pub spring: Option<Spring>,
    pub color: ColorCycle,
    /// Current color key in [0, 1]
    pub color_phase: f32,
    /// Ring boundaries are destroyed instead of letting bodies exit
    pub destructible: bool,
    /// Rings whose inner edge lies beyond this are ignored (off-screen)
    pub max_active_radius: Option<f32>,
}

impl Boundary {
    pub fn new(id: u32, center: Vec2, radius: f32, stroke_width: f32) -> Self {
        Self {
            id,
            center,
            radius,
            stroke_width,
            gap: GapGeometry::none(),
            rotation_rate: 0.0,
            spring: None,
            color: ColorCycle::Linear { speed: 0.0 },
            color_phase: 0.0,
            destructible: false,
            max_active_radius: None,
        }
    }

    /// Per-tick motion: gap rotation, spring recoil, color
    pub fn advance(&mut self, clock: f64) {
        if self.rotation_rate != 0.0 {
            self.gap.rotate(self.rotation_rate);
        }

        if let Some(spring) = self.spring.as_mut() {
            spring.step(&mut self.center);
        }

        self.color_phase = match self.color {
            ColorCycle::Linear { speed } => (self.color_phase + speed).rem_euclid(1.0),
            ColorCycle::Oscillate { period, offset } => {
                (((TAU / period * clock + offset).sin() + 1.0) / 2.0) as f32
            }
        };
    }

    /// Inner edge of the drawn stroke
    #[inline]
    pub fn inner_edge(&self) -> f32 {
        self.radius - self.stroke_width / 2.0
    }

    /// Whether bodies interact with this boundary at all
    pub fn collidable(&self) -> bool {
        self.max_active_radius.is_none_or(|max| self.inner_edge() <= max)
    }

    /// Solid wall pieces for rendering
    pub fn solid_arcs(&self) -> Vec<SolidArc> {
        self.gap.solid_arcs()
    }

    /// True if `body` is at or past the wall and inside the gap
    pub fn is_escaping(&self, body: &Body) -> bool {
        wall_contact(self.center, self.radius, body.pos, body.radius)
            .is_some_and(|contact| self.gap.contains(contact.angle))
    }

    /// Test `body` against the wall and reflect it off the solid arc.
    ///
    /// Escapes are only reported; the caller decides whether that means the
    /// body exits or the ring breaks. A bounce may add the minimum-bounce
    /// impulse and shocks the spring if the boundary has one.
    pub fn resolve(&mut self, body: &mut Body, min_bounce: Option<&MinBounce>) -> BoundaryContact {
        let Some(contact) = wall_contact(self.center, self.radius, body.pos, body.radius) else {
            return BoundaryContact::Clear;
        };

        if self.gap.contains(contact.angle) {
            return BoundaryContact::Escaped { angle: contact.angle };
        }

        let impact_velocity = body.vel;
        let n = contact.normal;
        let (pos, mut vel) = bounce_off_wall(self.center, &contact, body.vel);

        // Grazing hits get a kick so the body never settles on the wall
        if let Some(min_bounce) = min_bounce {
            if impact_velocity.dot(n).abs() < min_bounce.threshold {
                vel += n * min_bounce.impulse;
            }
        }

        body.pos = pos;
        body.vel = vel;

        if let Some(spring) = self.spring.as_mut() {
            spring.shock(n);
        }

        BoundaryContact::Bounced(CollisionEvent {
            body: body.id,
            kind: ContactKind::Boundary { boundary: self.id },
            point: self.center + n * self.radius,
            normal: -n,
            impact_velocity,
        })
    }

    /// Pull the ring inward by `delta`
    pub fn shrink_by(&mut self, delta: f32) {
        self.radius -= delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::BodySettings;
    use std::f32::consts::FRAC_PI_2;

    fn body_at(pos: Vec2, vel: Vec2, radius: f32) -> Body {
        let cfg = BodySettings {
            radius,
            ..BodySettings::default()
        };
        Body::new(1, pos, vel, &cfg, 0.0)
    }

    #[test]
    fn test_resolve_reflects_on_solid_wall() {
        let mut wall = Boundary::new(0, Vec2::ZERO, 100.0, 4.0);
        let mut body = body_at(Vec2::new(0.0, 95.0), Vec2::new(0.0, 5.0), 10.0);

        let BoundaryContact::Bounced(event) = wall.resolve(&mut body, None) else {
            panic!("expected a bounce");
        };
        assert!((body.pos.length() - 90.0).abs() < 1e-4);
        assert!((body.vel - Vec2::new(0.0, -5.0)).length() < 1e-5);
        assert_eq!(event.impact_velocity, Vec2::new(0.0, 5.0));
        assert!((event.normal - Vec2::new(0.0, -1.0)).length() < 1e-6);
        assert_eq!(event.kind, ContactKind::Boundary { boundary: 0 });
    }

    #[test]
    fn test_resolve_reports_escape_through_gap() {
        let mut wall = Boundary::new(0, Vec2::ZERO, 100.0, 4.0);
        // Gap straight up on screen (negative y)
        wall.gap = GapGeometry::new(FRAC_PI_2, 0.5);
        let mut body = body_at(Vec2::new(0.0, -95.0), Vec2::new(0.0, -5.0), 10.0);

        assert!(matches!(wall.resolve(&mut body, None), BoundaryContact::Escaped { .. }));
        // Untouched
        assert_eq!(body.vel, Vec2::new(0.0, -5.0));
        assert!(wall.is_escaping(&body));
    }

    #[test]
    fn test_min_bounce_kicks_grazing_hit() {
        let mut wall = Boundary::new(0, Vec2::ZERO, 100.0, 4.0);
        let mut body = body_at(Vec2::new(90.5, 0.0), Vec2::new(1.0, 4.0), 10.0);
        let min_bounce = MinBounce {
            threshold: 3.0,
            impulse: 10.0,
        };
        wall.resolve(&mut body, Some(&min_bounce));
        // Reflected (-1, 4) plus outward (10, 0)
        assert!((body.vel - Vec2::new(9.0, 4.0)).length() < 1e-4);
    }

    #[test]
    fn test_spring_recoils_and_settles() {
        let settings = SpringSettings {
            stiffness: 0.1,
            damping: 0.85,
            shock_force: 5.0,
        };
        let mut wall = Boundary::new(0, Vec2::new(540.0, 960.0), 500.0, 6.0);
        wall.spring = Some(Spring::new(wall.center, &settings));

        let mut body = body_at(Vec2::new(540.0, 1460.0), Vec2::new(0.0, 8.0), 18.0);
        assert!(matches!(wall.resolve(&mut body, None), BoundaryContact::Bounced(_)));

        wall.advance(0.0);
        assert!(wall.center.y > 960.0);
        for _ in 0..500 {
            wall.advance(0.0);
        }
        assert!((wall.center - Vec2::new(540.0, 960.0)).length() < 1e-3);
    }

    #[test]
    fn test_advance_rotates_gap_and_cycles_color() {
        let mut wall = Boundary::new(0, Vec2::ZERO, 100.0, 4.0);
        wall.gap = GapGeometry::new(0.0, 0.5);
        wall.rotation_rate = 0.01;
        wall.color = ColorCycle::Linear { speed: 0.4 };
        for _ in 0..3 {
            wall.advance(0.0);
        }
        assert!((wall.gap.center - 0.03).abs() < 1e-6);
        assert!((wall.color_phase - 0.2).abs() < 1e-5);

        wall.color = ColorCycle::Oscillate { period: 4.0, offset: 0.0 };
        wall.advance(1.0);
        assert!((wall.color_phase - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_collidable_respects_max_active_radius() {
        let mut ring = Boundary::new(0, Vec2::ZERO, 1200.0, 9.0);
        ring.max_active_radius = Some(1110.0);
        assert!(!ring.collidable());
        ring.shrink_by(90.0);
        assert!(ring.collidable());
    }
}
