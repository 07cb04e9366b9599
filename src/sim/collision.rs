//! Collision detection and response for circular walls and bodies
//!
//! Pure functions shared by every arena layout: contact against the inside of
//! a circle, reflection, and disc-disc response (equal-mass elastic exchange
//! or bounce off an immovable obstacle). Degenerate geometry (coincident
//! centers, a wall smaller than the body) always reports "no collision".

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::screen_angle;

/// Distances below this are treated as coincident points
const DEGENERATE_DISTANCE: f32 = 1e-6;

/// What a body touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    /// The solid arc of a boundary
    Boundary { boundary: u32 },
    /// Another active body (elastic exchange)
    Pair { other: u32 },
    /// A frozen body acting as a static obstacle
    Obstacle { obstacle: u32 },
    /// The opening of a boundary; the body left the arena
    Escape { boundary: u32 },
}

/// A single bounce, produced once per contact and consumed by event dispatch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// The body that bounced (for pairs, the lower id)
    pub body: u32,
    pub kind: ContactKind,
    /// Contact point (wall point, or midpoint between the two centers)
    pub point: Vec2,
    /// Unit normal pointing back toward the bouncing body
    pub normal: Vec2,
    /// Velocity of `body` before the bounce
    pub impact_velocity: Vec2,
}

/// Result of testing a body against the inside of a circular wall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallContact {
    /// Unit normal from the wall center toward the body
    pub normal: Vec2,
    /// Distance from the wall center to the body center
    pub distance: f32,
    /// Screen-space contact angle in [0, 2π)
    pub angle: f32,
    /// Distance the body center may reach: wall radius minus body radius
    pub limit: f32,
}

/// Check whether a body touches or passes the inside of a circular wall
///
/// Returns `None` when the body is comfortably inside, and also for
/// degenerate input (the body sits exactly on the center, or is at least as
/// large as the wall).
pub fn wall_contact(center: Vec2, wall_radius: f32, pos: Vec2, body_radius: f32) -> Option<WallContact> {
    let limit = wall_radius - body_radius;
    if limit <= 0.0 {
        return None;
    }

    let offset = pos - center;
    let distance = offset.length();
    if distance < limit || distance < DEGENERATE_DISTANCE {
        return None;
    }

    Some(WallContact {
        normal: offset / distance,
        distance,
        angle: screen_angle(offset),
        limit,
    })
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Place the body back on the wall and reflect its velocity.
///
/// Returns the corrected position and the reflected velocity. The position
/// lies exactly on the circle of radius `contact.limit`.
pub fn bounce_off_wall(center: Vec2, contact: &WallContact, velocity: Vec2) -> (Vec2, Vec2) {
    let position = center + contact.normal * contact.limit;
    (position, reflect_velocity(velocity, contact.normal))
}

/// A moving disc for pair resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disc {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

/// Overlap between two discs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscOverlap {
    /// Unit normal from the first disc toward the second
    pub normal: Vec2,
    /// Penetration depth (r1 + r2 - d)
    pub depth: f32,
}

/// Check two discs for overlap. Coincident centers never collide.
pub fn disc_overlap(a: &Disc, b: &Disc) -> Option<DiscOverlap> {
    let delta = b.pos - a.pos;
    let distance = delta.length();
    let reach = a.radius + b.radius;

    if distance >= reach || distance < DEGENERATE_DISTANCE {
        return None;
    }

    Some(DiscOverlap {
        normal: delta / distance,
        depth: reach - distance,
    })
}

/// Outcome of an equal-mass pair collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairResolution {
    pub a: Disc,
    pub b: Disc,
    pub normal: Vec2,
    /// False when the discs were already separating and `require_approach`
    /// skipped the velocity exchange
    pub exchanged: bool,
}

impl PairResolution {
    /// Midpoint between the two resolved centers
    pub fn midpoint(&self) -> Vec2 {
        (self.a.pos + self.b.pos) * 0.5
    }
}

/// Swap the normal velocity components of two equal-mass bodies.
///
/// Tangential components are untouched, so kinetic energy and momentum are
/// both conserved.
pub fn exchange_normal_velocity(v1: Vec2, v2: Vec2, normal: Vec2) -> (Vec2, Vec2) {
    let v1n = v1.dot(normal);
    let v2n = v2.dot(normal);
    (v1 + (v2n - v1n) * normal, v2 + (v1n - v2n) * normal)
}

/// Separate two overlapping discs by half the overlap each, then exchange
/// their normal velocities.
///
/// With `require_approach`, discs already moving apart keep their velocities.
pub fn resolve_elastic_pair(a: Disc, b: Disc, require_approach: bool) -> Option<PairResolution> {
    let overlap = disc_overlap(&a, &b)?;
    let n = overlap.normal;
    let half = overlap.depth * 0.5;

    let mut a = a;
    let mut b = b;
    a.pos -= n * half;
    b.pos += n * half;

    let closing = (b.vel - a.vel).dot(n);
    let exchanged = !require_approach || closing < 0.0;
    if exchanged {
        let (va, vb) = exchange_normal_velocity(a.vel, b.vel, n);
        a.vel = va;
        b.vel = vb;
    }

    Some(PairResolution {
        a,
        b,
        normal: n,
        exchanged,
    })
}

/// Bounce a moving disc off an immovable one.
///
/// The mover is pushed fully out of the obstacle (the obstacle cannot take
/// its half) and reflected as if off a wall. Returns the new mover and the
/// unit normal pointing from the obstacle toward it.
pub fn bounce_off_obstacle(mover: Disc, obstacle: &Disc) -> Option<(Disc, Vec2)> {
    let overlap = disc_overlap(obstacle, &mover)?;
    let n = overlap.normal;

    let mut mover = mover;
    mover.pos += n * overlap.depth;
    mover.vel = reflect_velocity(mover.vel, n);
    Some((mover, n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_velocity() {
        // Moving right, hits a vertical wall (normal pointing left)
        let reflected = reflect_velocity(Vec2::new(100.0, 0.0), Vec2::new(-1.0, 0.0));
        assert!((reflected.x - (-100.0)).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }

    #[test]
    fn test_wall_contact_inside_misses() {
        assert!(wall_contact(Vec2::ZERO, 100.0, Vec2::new(50.0, 0.0), 10.0).is_none());
    }

    #[test]
    fn test_wall_contact_touching() {
        let contact = wall_contact(Vec2::ZERO, 100.0, Vec2::new(0.0, 95.0), 10.0).unwrap();
        assert!((contact.normal - Vec2::Y).length() < 1e-6);
        assert_eq!(contact.limit, 90.0);
        // Below center on screen is 270°
        assert!((contact.angle - 1.5 * std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn test_wall_contact_degenerate() {
        // Body as large as the wall
        assert!(wall_contact(Vec2::ZERO, 10.0, Vec2::new(5.0, 0.0), 10.0).is_none());
    }

    #[test]
    fn test_bounce_off_wall_lands_on_circle() {
        let center = Vec2::new(10.0, -4.0);
        let pos = center + Vec2::new(70.0, 70.0);
        let contact = wall_contact(center, 100.0, pos, 10.0).unwrap();
        let vel = Vec2::new(3.0, 4.0);
        let (p, v) = bounce_off_wall(center, &contact, vel);
        assert!(((p - center).length() - 90.0).abs() < 1e-3);
        assert!((v.length() - 5.0).abs() < 1e-5);
        assert!(v.dot(contact.normal) < 0.0);
    }

    fn disc(pos: Vec2, vel: Vec2, radius: f32) -> Disc {
        Disc { pos, vel, radius }
    }

    #[test]
    fn test_elastic_pair_swaps_head_on() {
        let a = disc(Vec2::ZERO, Vec2::new(5.0, 0.0), 10.0);
        let b = disc(Vec2::new(15.0, 0.0), Vec2::new(-5.0, 0.0), 10.0);
        let res = resolve_elastic_pair(a, b, false).unwrap();
        assert!(res.exchanged);
        assert!(res.a.pos.distance(res.b.pos) >= 20.0 - 1e-5);
        assert!((res.a.vel - Vec2::new(-5.0, 0.0)).length() < 1e-6);
        assert!((res.b.vel - Vec2::new(5.0, 0.0)).length() < 1e-6);
        assert!((res.midpoint() - Vec2::new(7.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_elastic_pair_keeps_tangential() {
        let a = disc(Vec2::ZERO, Vec2::new(2.0, 3.0), 5.0);
        let b = disc(Vec2::new(8.0, 0.0), Vec2::new(-1.0, -7.0), 5.0);
        let res = resolve_elastic_pair(a, b, false).unwrap();
        assert!((res.a.vel - Vec2::new(-1.0, 3.0)).length() < 1e-6);
        assert!((res.b.vel - Vec2::new(2.0, -7.0)).length() < 1e-6);
    }

    #[test]
    fn test_require_approach_skips_separating_pair() {
        let a = disc(Vec2::ZERO, Vec2::new(-5.0, 0.0), 10.0);
        let b = disc(Vec2::new(15.0, 0.0), Vec2::new(5.0, 0.0), 10.0);
        let res = resolve_elastic_pair(a, b, true).unwrap();
        assert!(!res.exchanged);
        assert_eq!(res.a.vel, a.vel);
        assert_eq!(res.b.vel, b.vel);
        // Still separated
        assert!(res.a.pos.distance(res.b.pos) >= 20.0 - 1e-5);
    }

    #[test]
    fn test_coincident_discs_never_collide() {
        let a = disc(Vec2::ONE, Vec2::X, 10.0);
        assert!(resolve_elastic_pair(a, a, false).is_none());
        assert!(bounce_off_obstacle(a, &a).is_none());
    }

    #[test]
    fn test_bounce_off_obstacle_moves_only_mover() {
        let obstacle = disc(Vec2::ZERO, Vec2::ZERO, 30.0);
        let mover = disc(Vec2::new(0.0, -50.0), Vec2::new(1.0, 4.0), 30.0);
        let (moved, n) = bounce_off_obstacle(mover, &obstacle).unwrap();
        assert!((n - Vec2::new(0.0, -1.0)).length() < 1e-6);
        assert!((moved.pos.length() - 60.0).abs() < 1e-4);
        assert!((moved.vel - Vec2::new(1.0, -4.0)).length() < 1e-6);
    }
}
