//! Moving bodies (balls)

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::collision::Disc;
use super::sequencer::{Chord, Cooldown};
use crate::settings::{BodySettings, Bounds};

/// Lifecycle of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyState {
    /// Integrates and collides
    Active,
    /// Static obstacle for active bodies
    Frozen,
    /// Left through a gap: keeps falling, never collides
    Exited,
}

/// Trail point for ghost rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub speed: f32,
}

/// A body entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: u32,
    pub pos: Vec2,
    /// Position at the start of the current tick
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Frame-to-physics multiplier; only grows
    pub time_scale: f32,
    pub state: BodyState,
    /// Team/label index (race variant)
    pub team: u8,
    /// Color key in [0, 1)
    pub hue: f32,
    /// Engine clock at spawn
    pub spawn_time: f64,
    /// Rings this body has destroyed
    pub rings_cleared: u32,
    /// Notes this body is responsible for silencing
    pub chord: Chord,
    /// Minimum time between this body's note triggers
    pub note_cooldown: Cooldown,
    /// Recent positions, newest first
    pub trail: VecDeque<TrailPoint>,
    trail_length: usize,
}

impl Body {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, settings: &BodySettings, spawn_time: f64) -> Self {
        Self {
            id,
            pos,
            prev_pos: pos,
            vel,
            radius: settings.radius,
            time_scale: settings.time_scale,
            state: BodyState::Active,
            team: 0,
            hue: 0.0,
            spawn_time,
            rings_cleared: 0,
            chord: Chord::default(),
            note_cooldown: Cooldown::new(settings.note_cooldown),
            trail: VecDeque::with_capacity(settings.trail_length),
            trail_length: settings.trail_length,
        }
    }

    pub fn with_team(mut self, team: u8) -> Self {
        self.team = team;
        self
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == BodyState::Active
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.state == BodyState::Frozen
    }

    #[inline]
    pub fn is_exited(&self) -> bool {
        self.state == BodyState::Exited
    }

    /// Apply gravity and move by `velocity * time_scale`. Frozen bodies stay put.
    pub fn integrate(&mut self, gravity: f32) {
        self.prev_pos = self.pos;
        if self.is_frozen() {
            return;
        }
        self.vel.y += gravity;
        self.pos += self.vel * self.time_scale;
    }

    /// Record current position to trail (call each tick while active)
    pub fn record_trail(&mut self) {
        if self.trail_length == 0 {
            return;
        }
        let speed = self.vel.length();
        self.trail.push_front(TrailPoint { pos: self.pos, speed });
        self.trail.truncate(self.trail_length);
    }

    pub fn advance_hue(&mut self, hue_speed: f32) {
        self.hue = (self.hue + hue_speed).rem_euclid(1.0);
    }

    /// Grow and speed up after a wall bounce
    pub fn on_bounce(&mut self, settings: &BodySettings) {
        self.radius += settings.growth;
        if let Some(max_radius) = settings.max_radius {
            self.radius = self.radius.min(max_radius);
        }
        self.time_scale = (self.time_scale * settings.time_accel).min(settings.max_time_scale);
    }

    /// True once the freeze delay has elapsed since spawn
    pub fn should_freeze(&self, now: f64, delay: f64) -> bool {
        self.is_active() && now - self.spawn_time >= delay
    }

    pub fn freeze(&mut self) {
        self.state = BodyState::Frozen;
        self.vel = Vec2::ZERO;
        self.trail.clear();
    }

    pub fn exit(&mut self) {
        self.state = BodyState::Exited;
        self.trail.clear();
    }

    /// Collision view of this body
    pub fn disc(&self) -> Disc {
        Disc {
            pos: self.pos,
            vel: self.vel,
            radius: self.radius,
        }
    }

    pub fn apply_disc(&mut self, disc: &Disc) {
        self.pos = disc.pos;
        self.vel = disc.vel;
    }

    /// True once the whole circle lies outside `bounds`
    pub fn is_outside(&self, bounds: &Bounds) -> bool {
        !bounds.overlaps_circle(self.pos, self.radius)
    }
}
