//! Short-lived visual particles
//!
//! Purely cosmetic: nothing in the simulation reads particles back. They are
//! still driven by the seeded RNG so a replay looks identical.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Rendering hint for a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleStyle {
    /// Wall-bounce spark, tinted with the body's hue
    Spark,
    /// White flash from a body-body collision
    Flash,
    /// Fragment of a destroyed ring, tinted with the ring's color phase
    Shard,
}

/// Randomization ranges for one particle style
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleProfile {
    /// Each velocity component gets a uniform offset in [-jitter, jitter]
    pub jitter: f32,
    /// Lifetime range in ticks (inclusive)
    pub lifetime: (u32, u32),
    /// Size range (inclusive)
    pub size: (f32, f32),
}

impl ParticleProfile {
    pub fn is_valid(&self) -> bool {
        self.jitter >= 0.0
            && self.lifetime.0 >= 1
            && self.lifetime.0 <= self.lifetime.1
            && self.size.0 >= 0.0
            && self.size.0 <= self.size.1
    }
}

/// A single particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining lifetime in ticks
    pub life: u32,
    /// Lifetime at spawn
    pub max_life: u32,
    pub size: f32,
    pub style: ParticleStyle,
    /// Color key in [0, 1) (hue or ring color phase)
    pub hue: f32,
}

impl Particle {
    /// Remaining life in (0, 1], for fading
    pub fn life_fraction(&self) -> f32 {
        if self.max_life == 0 {
            0.0
        } else {
            self.life as f32 / self.max_life as f32
        }
    }

    fn update(&mut self, gravity: f32) {
        self.vel.y += gravity;
        self.pos += self.vel;
        self.life = self.life.saturating_sub(1);
    }
}

/// All live particles. No cap: every collision gets its full burst.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticleField {
    particles: Vec<Particle>,
    /// Downward acceleration per tick
    pub gravity: f32,
}

impl ParticleField {
    pub fn new(gravity: f32) -> Self {
        Self {
            particles: Vec::new(),
            gravity,
        }
    }

    /// Add `count` particles at `pos` moving with `bias` plus random jitter
    #[allow(clippy::too_many_arguments)]
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        pos: Vec2,
        bias: Vec2,
        count: usize,
        style: ParticleStyle,
        profile: &ParticleProfile,
        hue: f32,
    ) {
        self.particles.reserve(count);
        for _ in 0..count {
            let particle = make_particle(rng, pos, bias, style, profile, hue);
            self.particles.push(particle);
        }
    }

    /// Particles flying out of `center` in random directions
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_burst<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        center: Vec2,
        count: usize,
        speed: (f32, f32),
        style: ParticleStyle,
        profile: &ParticleProfile,
        hue: f32,
    ) {
        self.particles.reserve(count);
        for _ in 0..count {
            let angle = rng.random_range(0.0..TAU);
            let speed = rng.random_range(speed.0..=speed.1);
            let bias = Vec2::from_angle(angle) * speed;
            let particle = make_particle(rng, center, bias, style, profile, hue);
            self.particles.push(particle);
        }
    }

    /// Particles scattered along a circle, moving outward
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_ring<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        center: Vec2,
        radius: f32,
        count: usize,
        speed: (f32, f32),
        style: ParticleStyle,
        profile: &ParticleProfile,
        hue: f32,
    ) {
        self.particles.reserve(count);
        for _ in 0..count {
            let dir = Vec2::from_angle(rng.random_range(0.0..TAU));
            let speed = rng.random_range(speed.0..=speed.1);
            let particle = make_particle(rng, center + dir * radius, dir * speed, style, profile, hue);
            self.particles.push(particle);
        }
    }

    /// Apply gravity, move, age, and drop expired particles
    pub fn tick(&mut self) {
        let gravity = self.gravity;
        for particle in self.particles.iter_mut() {
            particle.update(gravity);
        }
        self.particles.retain(|p| p.life > 0);
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }
}

fn make_particle<R: Rng + ?Sized>(
    rng: &mut R,
    pos: Vec2,
    bias: Vec2,
    style: ParticleStyle,
    profile: &ParticleProfile,
    hue: f32,
) -> Particle {
    let j = profile.jitter;
    let jitter = Vec2::new(rng.random_range(-j..=j), rng.random_range(-j..=j));
    let life = rng.random_range(profile.lifetime.0..=profile.lifetime.1);
    Particle {
        pos,
        vel: bias + jitter,
        life,
        max_life: life,
        size: rng.random_range(profile.size.0..=profile.size.1),
        style,
        hue,
    }
}
