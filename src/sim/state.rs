//! Arena state and core simulation types
//!
//! Everything a tick mutates lives here: boundaries, bodies, particles, the
//! sequencer cursor and the cooldowns. Given the same settings, seed, score
//! and elapsed-time inputs, two states evolve identically.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::TAU;

use super::body::Body;
use super::boundary::{Boundary, ColorCycle, Spring};
use super::collision::CollisionEvent;
use super::gap::GapGeometry;
use super::particles::ParticleField;
use super::sequencer::{Chord, Cooldown, EventSequencer, Note};
use crate::audio::SoundEffect;
use crate::error::Result;
use crate::score::NoteEvent;
use crate::settings::{ArenaLayout, Settings, SpawnRule, Variant};

/// Something that happened during the last tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Collision(CollisionEvent),
    /// A body left through the gap of a non-destructible boundary
    Escaped { body: u32, boundary: u32 },
    /// A ring was traversed and removed
    RingDestroyed { boundary: u32, by: u32 },
    Frozen { body: u32 },
    Spawned { body: u32 },
    Despawned { body: u32 },
    ChordStarted { body: u32, notes: Vec<Note> },
    ChordStopped { body: u32 },
    Effect(SoundEffect),
    /// The last chord of the score was just played
    ScoreExhausted,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct ArenaState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub settings: Settings,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Engine clock in seconds (sum of elapsed inputs)
    pub clock: f64,
    /// Boundaries in ascending radius order (stable ids)
    pub boundaries: Vec<Boundary>,
    /// Bodies sorted by id
    pub bodies: Vec<Body>,
    pub particles: ParticleField,
    pub sequencer: EventSequencer,
    /// Held chord when ownership is shared
    pub shared_chord: Chord,
    /// Global rate limit for sound effects
    pub effect_cooldown: Cooldown,
    /// Events produced by the most recent tick
    pub events: Vec<SimEvent>,
    pub rings_destroyed: u32,
    /// Bodies spawned since setup (drives chain velocities)
    spawned: u32,
    next_id: u32,
    pub(crate) rng: Pcg32,
}

impl ArenaState {
    /// Build a validated simulation from settings and a pre-sorted score
    pub fn new(settings: Settings, score: Vec<NoteEvent>, seed: u64) -> Result<Self> {
        settings.validate()?;

        let mut state = Self {
            seed,
            time_ticks: 0,
            clock: 0.0,
            boundaries: Vec::new(),
            bodies: Vec::new(),
            particles: ParticleField::new(settings.gravity),
            sequencer: EventSequencer::new(score).with_epsilon(settings.audio.chord_epsilon),
            shared_chord: Chord::default(),
            effect_cooldown: Cooldown::new(settings.audio.effect_cooldown),
            events: Vec::new(),
            rings_destroyed: 0,
            spawned: 0,
            next_id: 1,
            rng: Pcg32::seed_from_u64(seed),
            settings,
        };

        state.build_boundaries();

        let initial = state.settings.bodies.initial.clone();
        for body in initial {
            state.spawn_body(body.position, body.velocity, body.team);
        }
        if state.bodies.is_empty() {
            state.spawn_chain_body();
        }

        log::info!(
            "Arena ready: {} boundaries, {} bodies, {} score entries (seed {})",
            state.boundaries.len(),
            state.bodies.len(),
            state.sequencer.len(),
            seed
        );
        Ok(state)
    }

    /// Build the preset simulation for `variant`
    pub fn from_variant(variant: Variant, score: Vec<NoteEvent>, seed: u64) -> Result<Self> {
        Self::new(variant.settings(), score, seed)
    }

    fn build_boundaries(&mut self) {
        let hue_speed = self.settings.hue_speed;
        match &self.settings.arena {
            ArenaLayout::Circle(circle) => {
                let mut boundary = Boundary::new(0, circle.center, circle.radius, circle.stroke_width);
                if let Some(gap) = &circle.gap {
                    boundary.gap = GapGeometry::new(gap.center, gap.width);
                }
                boundary.rotation_rate = circle.rotation_rate;
                boundary.spring = circle.spring.as_ref().map(|s| Spring::new(circle.center, s));
                boundary.color = ColorCycle::Linear { speed: hue_speed };
                self.boundaries.push(boundary);
            }
            ArenaLayout::Rings(rings) => {
                self.boundaries.reserve(rings.count as usize);
                for i in 0..rings.count {
                    let mut ring = Boundary::new(i, rings.center, rings.radius_of(i), rings.stroke_width);
                    ring.gap = GapGeometry::new(rings.gap_shift * i as f32, rings.gap_width);
                    ring.rotation_rate = rings.rotation_rate;
                    ring.destructible = true;
                    ring.max_active_radius = rings.max_active_radius;
                    ring.color = ColorCycle::Oscillate {
                        period: self.rng.random_range(rings.color_period.0..=rings.color_period.1),
                        offset: self.rng.random_range(0.0..TAU),
                    };
                    self.boundaries.push(ring);
                }
            }
        }
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add an active body; returns its id
    pub fn spawn_body(&mut self, pos: Vec2, vel: Vec2, team: u8) -> u32 {
        let id = self.next_entity_id();
        let body = Body::new(id, pos, vel, &self.settings.bodies, self.clock).with_team(team);
        self.bodies.push(body);
        self.spawned += 1;
        self.events.push(SimEvent::Spawned { body: id });
        log::debug!("Spawned body {} at ({:.1}, {:.1})", id, pos.x, pos.y);
        id
    }

    /// Spawn the next body of a freeze chain (no-op for other rules)
    pub(crate) fn spawn_chain_body(&mut self) -> Option<u32> {
        let SpawnRule::ChainOnFreeze {
            region,
            base_velocity,
            velocity_step,
        } = self.settings.spawn
        else {
            return None;
        };

        let pos = Vec2::new(
            self.rng.random_range(region.min.x..=region.max.x),
            self.rng.random_range(region.min.y..=region.max.y),
        );
        let vel = base_velocity + velocity_step * self.spawned as f32;
        Some(self.spawn_body(pos, vel, 0))
    }

    /// Two fresh bodies for one exit (no-op for other rules)
    pub(crate) fn spawn_split_pair(&mut self) {
        let SpawnRule::SplitOnExit { center, offset, speed } = self.settings.spawn else {
            return;
        };

        for side in [-1.0, 1.0] {
            let heading = self.rng.random_range(0.0..std::f32::consts::TAU);
            let pos = center + Vec2::new(side * offset, 0.0);
            self.spawn_body(pos, Vec2::from_angle(heading) * speed, 0);
        }
    }

    pub fn body(&self, id: u32) -> Option<&Body> {
        self.bodies
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|index| &self.bodies[index])
    }

    pub fn boundary(&self, id: u32) -> Option<&Boundary> {
        self.boundaries.iter().find(|b| b.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.is_active()).count()
    }

    /// Rings destroyed per team
    pub fn tally(&self) -> BTreeMap<u8, u32> {
        let mut tally = BTreeMap::new();
        for body in &self.bodies {
            *tally.entry(body.team).or_insert(0) += body.rings_cleared;
        }
        tally
    }

    /// Seconds left on the match clock, if the settings define one
    pub fn time_left(&self) -> Option<f64> {
        self.settings.duration.map(|d| (d - self.clock).max(0.0))
    }

    /// True once the match clock ran out
    pub fn is_finished(&self) -> bool {
        self.time_left() == Some(0.0)
    }
}
