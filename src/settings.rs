//! Simulation settings and variant presets
//!
//! Everything that distinguishes one animation from another is data: the
//! arena layout, body tuning, the spawn rule and how collisions map to sound.
//! Settings round-trip through JSON and are validated before a simulation is
//! built from them.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::consts::{CHORD_EPSILON, PORTRAIT_HEIGHT, PORTRAIT_WIDTH, SQUARE_SIZE};
use crate::error::{ArenaError, Result};
use crate::sim::particles::ParticleProfile;

/// The four shipped animations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Static gapped circle; each body freezes after a delay and the next one spawns
    #[default]
    Freeze,
    /// Spring-mounted closed circle; one body that grows and speeds up
    Pulse,
    /// Rotating gapped circle; every escape splits into two new bodies
    Rotation,
    /// Two teams breaking through concentric rotating rings
    RingRace,
}

impl Variant {
    pub const ALL: [Variant; 4] = [Variant::Freeze, Variant::Pulse, Variant::Rotation, Variant::RingRace];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Freeze => "freeze",
            Variant::Pulse => "pulse",
            Variant::Rotation => "rotation",
            Variant::RingRace => "ring-race",
        }
    }

    /// Preset settings for this variant
    pub fn settings(&self) -> Settings {
        match self {
            Variant::Freeze => Settings::freeze(),
            Variant::Pulse => Settings::pulse(),
            Variant::Rotation => Settings::rotation(),
            Variant::RingRace => Settings::ring_race(),
        }
    }
}

impl FromStr for Variant {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "freeze" => Ok(Variant::Freeze),
            "pulse" | "music-speed" => Ok(Variant::Pulse),
            "rotation" => Ok(Variant::Rotation),
            "ring-race" | "race" => Ok(Variant::RingRace),
            _ => Err(ArenaError::UnknownVariant(s.to_string())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned rectangle (screen space)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    /// The canvas `[0, width] x [0, height]`
    pub fn screen(width: f32, height: f32) -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(width, height),
        }
    }

    /// True if any part of the circle lies inside the rectangle
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        center.x + radius >= self.min.x
            && center.x - radius <= self.max.x
            && center.y + radius >= self.min.y
            && center.y - radius <= self.max.y
    }

    fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }
}

/// Gap on a single circle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapSettings {
    /// Center angle (radians, counter-clockwise on screen)
    pub center: f32,
    /// Total angular width (radians); 0 closes the circle
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringSettings {
    pub stiffness: f32,
    pub damping: f32,
    pub shock_force: f32,
}

/// Shrink of the whole boundary set toward a floor radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShrinkSettings {
    /// Smallest radius the innermost boundary shrinks toward
    pub floor: f32,
    /// Fraction of the distance to the floor covered per tick
    pub factor: f32,
    /// Per-tick cap
    pub max_per_tick: f32,
}

impl ShrinkSettings {
    /// Per-tick shrink given the current smallest radius
    pub fn delta(&self, current_min: f32) -> f32 {
        ((current_min - self.floor) * self.factor).clamp(0.0, self.max_per_tick)
    }
}

/// One circular wall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleSettings {
    pub center: Vec2,
    pub radius: f32,
    pub stroke_width: f32,
    pub gap: Option<GapSettings>,
    /// Gap rotation per tick (radians)
    #[serde(default)]
    pub rotation_rate: f32,
    pub spring: Option<SpringSettings>,
    pub shrink: Option<ShrinkSettings>,
}

/// Concentric destructible rings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingSettings {
    pub center: Vec2,
    pub count: u32,
    /// Radius of the innermost ring
    pub base_radius: f32,
    pub stroke_width: f32,
    /// Clear space between consecutive strokes
    pub spacing: f32,
    pub gap_width: f32,
    /// Gap center offset per ring index (radians)
    pub gap_shift: f32,
    pub rotation_rate: f32,
    pub shrink: Option<ShrinkSettings>,
    /// Rings whose inner edge lies beyond this are ignored
    pub max_active_radius: Option<f32>,
    /// Range the per-ring color period is drawn from (seconds)
    pub color_period: (f64, f64),
}

impl RingSettings {
    /// Radius of ring `index` at setup
    pub fn radius_of(&self, index: u32) -> f32 {
        self.base_radius + index as f32 * (self.stroke_width + self.spacing)
    }
}

/// Arena layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ArenaLayout {
    Circle(CircleSettings),
    Rings(RingSettings),
}

impl ArenaLayout {
    /// Center of the arena
    pub fn center(&self) -> Vec2 {
        match self {
            ArenaLayout::Circle(circle) => circle.center,
            ArenaLayout::Rings(rings) => rings.center,
        }
    }

    pub fn shrink(&self) -> Option<&ShrinkSettings> {
        match self {
            ArenaLayout::Circle(circle) => circle.shrink.as_ref(),
            ArenaLayout::Rings(rings) => rings.shrink.as_ref(),
        }
    }
}

/// Kick applied to grazing wall hits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinBounce {
    /// Normal speed below which the kick applies
    pub threshold: f32,
    pub impulse: f32,
}

/// A body present at setup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySeed {
    pub position: Vec2,
    pub velocity: Vec2,
    #[serde(default)]
    pub team: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodySettings {
    pub radius: f32,
    /// Radius added on every wall bounce
    pub growth: f32,
    pub max_radius: Option<f32>,
    pub time_scale: f32,
    pub max_time_scale: f32,
    /// Multiplier applied to the time scale on every wall bounce
    pub time_accel: f32,
    pub trail_length: usize,
    /// Seconds after spawn before an active body freezes
    pub freeze_delay: Option<f64>,
    /// Minimum seconds between two note triggers of one body
    pub note_cooldown: f64,
    pub min_bounce: Option<MinBounce>,
    pub initial: Vec<BodySeed>,
    /// Exited bodies are removed once fully outside this rectangle
    pub despawn_bounds: Option<Bounds>,
}

impl Default for BodySettings {
    fn default() -> Self {
        Self {
            radius: 18.0,
            growth: 0.0,
            max_radius: None,
            time_scale: 0.3,
            max_time_scale: 0.3,
            time_accel: 1.0,
            trail_length: 0,
            freeze_delay: None,
            note_cooldown: 0.0,
            min_bounce: None,
            initial: Vec::new(),
            despawn_bounds: None,
        }
    }
}

/// When new bodies appear
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum SpawnRule {
    #[default]
    None,
    /// Spawn inside `region` whenever the newest body stops being active.
    /// The n-th body gets `base_velocity + n * velocity_step`.
    ChainOnFreeze {
        region: Bounds,
        base_velocity: Vec2,
        velocity_step: Vec2,
    },
    /// Replace every exited body with two at `center ± (offset, 0)`,
    /// each with a random heading at `speed`
    SplitOnExit { center: Vec2, offset: f32, speed: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    pub pair_collisions: bool,
    /// Skip the exchange (and its event) for pairs already moving apart
    pub require_approach: bool,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            pair_collisions: true,
            require_approach: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSettings {
    /// Sparks per wall bounce
    pub bounce_count: usize,
    /// Fraction of the impact velocity the sparks inherit
    pub bounce_bias: f32,
    /// Flashes per body-body collision
    pub pair_count: usize,
    pub pair_speed: (f32, f32),
    /// Shards per destroyed ring
    pub ring_count: usize,
    pub ring_speed: (f32, f32),
    /// Sparks when a body leaves through a gap
    pub escape_count: usize,
    pub spark: ParticleProfile,
    pub flash: ParticleProfile,
    pub shard: ParticleProfile,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            bounce_count: 30,
            bounce_bias: 0.3,
            pair_count: 0,
            pair_speed: (1.0, 3.0),
            ring_count: 0,
            ring_speed: (1.0, 4.0),
            escape_count: 20,
            spark: ParticleProfile {
                jitter: 4.0,
                lifetime: (40, 80),
                size: (4.0, 8.0),
            },
            flash: ParticleProfile {
                jitter: 3.0,
                lifetime: (15, 30),
                size: (2.0, 4.0),
            },
            shard: ParticleProfile {
                jitter: 3.0,
                lifetime: (30, 60),
                size: (3.0, 6.0),
            },
        }
    }
}

/// What a kind of contact sounds like
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SoundTrigger {
    #[default]
    Silent,
    /// Advance the score and play the next chord
    Chord,
    /// Fire a sound effect (rate limited)
    Effect,
}

/// Who is responsible for stopping a sounding chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChordOwnership {
    /// Each body silences its own previous chord
    #[default]
    PerBody,
    /// One chord slot shared by every body
    Shared,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioRouting {
    pub wall: SoundTrigger,
    pub pair: SoundTrigger,
    pub ring: SoundTrigger,
    /// A body leaving through the gap of a non-destructible boundary
    pub escape: SoundTrigger,
    /// Global minimum seconds between two effects
    pub effect_cooldown: f64,
    /// Number of interchangeable samples per bounce effect
    pub effect_variations: u8,
    pub chord_ownership: ChordOwnership,
    /// Onsets closer than this form one chord (seconds)
    pub chord_epsilon: f64,
}

impl Default for AudioRouting {
    fn default() -> Self {
        Self {
            wall: SoundTrigger::Chord,
            pair: SoundTrigger::Chord,
            ring: SoundTrigger::Silent,
            escape: SoundTrigger::Chord,
            effect_cooldown: 0.0,
            effect_variations: 1,
            chord_ownership: ChordOwnership::PerBody,
            chord_epsilon: CHORD_EPSILON,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Added to vertical velocity every tick
    pub gravity: f32,
    /// Per-tick hue drift for bodies and linear-color boundaries
    pub hue_speed: f32,
    /// Match length in seconds (race clock)
    pub duration: Option<f64>,
    pub arena: ArenaLayout,
    pub bodies: BodySettings,
    pub spawn: SpawnRule,
    pub collisions: CollisionSettings,
    pub particles: ParticleSettings,
    pub audio: AudioRouting,
}

impl Default for Settings {
    fn default() -> Self {
        Self::freeze()
    }
}

impl Settings {
    /// Chain of freezing bodies inside a gapped circle
    pub fn freeze() -> Self {
        Self {
            gravity: 0.3,
            hue_speed: 0.002,
            duration: None,
            arena: ArenaLayout::Circle(CircleSettings {
                center: Vec2::new(PORTRAIT_WIDTH / 2.0, PORTRAIT_HEIGHT / 2.0),
                radius: 500.0,
                stroke_width: 6.0,
                gap: Some(GapSettings {
                    center: PI / 1.2,
                    width: PI / 4.0,
                }),
                rotation_rate: 0.0,
                spring: None,
                shrink: None,
            }),
            bodies: BodySettings {
                radius: 30.0,
                time_scale: 0.4,
                max_time_scale: 0.4,
                trail_length: 4,
                freeze_delay: Some(3.0),
                despawn_bounds: Some(Bounds::screen(PORTRAIT_WIDTH, PORTRAIT_HEIGHT)),
                ..BodySettings::default()
            },
            spawn: SpawnRule::ChainOnFreeze {
                region: Bounds {
                    min: Vec2::new(PORTRAIT_WIDTH * 0.2, PORTRAIT_HEIGHT * 0.2),
                    max: Vec2::new(PORTRAIT_WIDTH * 0.6, PORTRAIT_HEIGHT * 0.4),
                },
                base_velocity: Vec2::new(-8.0, 7.0),
                velocity_step: Vec2::ZERO,
            },
            collisions: CollisionSettings::default(),
            particles: ParticleSettings {
                bounce_count: 12,
                pair_count: 16,
                ..ParticleSettings::default()
            },
            audio: AudioRouting::default(),
        }
    }

    /// One body in a spring-mounted circle, growing and accelerating
    pub fn pulse() -> Self {
        Self {
            gravity: 0.3,
            hue_speed: 0.002,
            duration: None,
            arena: ArenaLayout::Circle(CircleSettings {
                center: Vec2::new(PORTRAIT_WIDTH / 2.0, PORTRAIT_HEIGHT / 2.0),
                radius: 500.0,
                stroke_width: 6.0,
                gap: None,
                rotation_rate: 0.0,
                spring: Some(SpringSettings {
                    stiffness: 0.1,
                    damping: 0.85,
                    shock_force: 0.0,
                }),
                shrink: None,
            }),
            bodies: BodySettings {
                radius: 18.0,
                growth: 1.5,
                max_radius: Some(450.0),
                time_scale: 0.3,
                max_time_scale: 1.6,
                time_accel: 1.017,
                trail_length: 20,
                initial: vec![BodySeed {
                    position: Vec2::new(450.0, 834.0),
                    velocity: Vec2::new(15.0, 9.0),
                    team: 0,
                }],
                ..BodySettings::default()
            },
            spawn: SpawnRule::None,
            collisions: CollisionSettings::default(),
            particles: ParticleSettings::default(),
            audio: AudioRouting {
                pair: SoundTrigger::Silent,
                ..AudioRouting::default()
            },
        }
    }

    /// Rotating gapped circle where every escape splits in two
    pub fn rotation() -> Self {
        let center = Vec2::splat(SQUARE_SIZE / 2.0);
        let start_velocity = Vec2::new(19.0, 23.0);
        Self {
            gravity: 0.3,
            hue_speed: 0.002,
            duration: None,
            arena: ArenaLayout::Circle(CircleSettings {
                center,
                radius: 500.0,
                stroke_width: 6.0,
                gap: Some(GapSettings {
                    center: 0.0,
                    width: 30.0_f32.to_radians(),
                }),
                rotation_rate: 0.7_f32.to_radians(),
                spring: Some(SpringSettings {
                    stiffness: 0.1,
                    damping: 0.85,
                    shock_force: 0.0,
                }),
                shrink: None,
            }),
            bodies: BodySettings {
                radius: 18.0,
                time_scale: 0.3,
                max_time_scale: 1.6,
                trail_length: 30,
                initial: vec![BodySeed {
                    position: Vec2::new(800.0, 834.0),
                    velocity: start_velocity,
                    team: 0,
                }],
                despawn_bounds: Some(Bounds::screen(SQUARE_SIZE, SQUARE_SIZE)),
                ..BodySettings::default()
            },
            spawn: SpawnRule::SplitOnExit {
                center,
                offset: 30.0,
                speed: start_velocity.length(),
            },
            collisions: CollisionSettings::default(),
            particles: ParticleSettings {
                pair_count: 12,
                ..ParticleSettings::default()
            },
            audio: AudioRouting {
                wall: SoundTrigger::Effect,
                pair: SoundTrigger::Effect,
                escape: SoundTrigger::Effect,
                effect_cooldown: 0.1,
                effect_variations: 6,
                ..AudioRouting::default()
            },
        }
    }

    /// Two teams racing through 156 rotating rings against a 29 s clock
    pub fn ring_race() -> Self {
        let center = Vec2::new(PORTRAIT_WIDTH / 2.0, PORTRAIT_HEIGHT / 2.0);
        let stroke_width = 9.0;
        let velocity = Vec2::new(20.0, 15.0);
        Self {
            gravity: 0.4,
            hue_speed: 0.002,
            duration: Some(29.0),
            arena: ArenaLayout::Rings(RingSettings {
                center,
                count: 156,
                base_radius: 200.0,
                stroke_width,
                spacing: 25.0,
                gap_width: PI / 2.5,
                gap_shift: 0.1,
                rotation_rate: 0.01,
                shrink: Some(ShrinkSettings {
                    floor: 200.0,
                    factor: 0.01,
                    max_per_tick: 5.0,
                }),
                // Screen half-diagonal plus one stroke
                max_active_radius: Some(center.length() + stroke_width),
                color_period: (2.0, 5.0),
            }),
            bodies: BodySettings {
                radius: 50.0,
                time_scale: 0.35,
                max_time_scale: 0.35,
                trail_length: 9,
                note_cooldown: 0.1,
                min_bounce: Some(MinBounce {
                    threshold: 3.0,
                    impulse: 10.0,
                }),
                initial: vec![
                    BodySeed {
                        position: center + Vec2::new(-150.0, -200.0),
                        velocity,
                        team: 0,
                    },
                    BodySeed {
                        position: center + Vec2::new(100.0, -200.0),
                        velocity,
                        team: 1,
                    },
                ],
                ..BodySettings::default()
            },
            spawn: SpawnRule::None,
            collisions: CollisionSettings {
                pair_collisions: true,
                require_approach: true,
            },
            particles: ParticleSettings {
                bounce_count: 10,
                pair_count: 25,
                pair_speed: (1.0, 3.0),
                ring_count: 50,
                ring_speed: (1.0, 4.0),
                ..ParticleSettings::default()
            },
            audio: AudioRouting {
                wall: SoundTrigger::Chord,
                pair: SoundTrigger::Silent,
                ring: SoundTrigger::Effect,
                ..AudioRouting::default()
            },
        }
    }

    /// Parse and validate settings from JSON. Missing fields fall back to the
    /// freeze preset.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the simulation cannot run
    pub fn validate(&self) -> Result<()> {
        require(self.gravity.is_finite(), "gravity", "must be finite")?;
        require(self.hue_speed.is_finite(), "hue_speed", "must be finite")?;
        if let Some(duration) = self.duration {
            require(duration > 0.0, "duration", "must be positive")?;
        }

        let body = &self.bodies;
        require(body.radius > 0.0, "bodies.radius", "must be positive")?;
        require(body.growth >= 0.0, "bodies.growth", "must not be negative")?;
        if let Some(max_radius) = body.max_radius {
            require(max_radius >= body.radius, "bodies.max_radius", "must be at least the radius")?;
        }
        require(body.time_scale > 0.0, "bodies.time_scale", "must be positive")?;
        require(
            body.max_time_scale >= body.time_scale,
            "bodies.max_time_scale",
            "must be at least the time scale",
        )?;
        require(body.time_accel >= 1.0, "bodies.time_accel", "must be at least 1")?;
        if let Some(delay) = body.freeze_delay {
            require(delay >= 0.0, "bodies.freeze_delay", "must not be negative")?;
        }
        require(body.note_cooldown >= 0.0, "bodies.note_cooldown", "must not be negative")?;
        if let Some(bounds) = &body.despawn_bounds {
            require(bounds.min.is_finite() && bounds.max.is_finite(), "bodies.despawn_bounds", "must be finite")?;
            require(bounds.is_valid(), "bodies.despawn_bounds", "min must not exceed max")?;
        }
        for seed in &body.initial {
            require(
                seed.position.is_finite() && seed.velocity.is_finite(),
                "bodies.initial",
                "positions and velocities must be finite",
            )?;
        }
        if body.growth > 0.0 && body.max_radius.is_none() {
            return Err(ArenaError::invalid("bodies.max_radius", "growing bodies need a cap"));
        }
        let largest = body.max_radius.unwrap_or(body.radius);
        if let Some(min_bounce) = &body.min_bounce {
            require(min_bounce.threshold >= 0.0, "bodies.min_bounce.threshold", "must not be negative")?;
        }

        match &self.arena {
            ArenaLayout::Circle(circle) => {
                require(circle.center.is_finite(), "arena.center", "must be finite")?;
                require(circle.radius > 0.0, "arena.radius", "must be positive")?;
                require(circle.stroke_width >= 0.0, "arena.stroke_width", "must not be negative")?;
                require(circle.rotation_rate.is_finite(), "arena.rotation_rate", "must be finite")?;
                require(circle.radius > largest, "arena.radius", "must exceed the largest body radius")?;
                if let Some(gap) = &circle.gap {
                    require(gap.center.is_finite(), "arena.gap.center", "must be finite")?;
                    require(gap.width >= 0.0, "arena.gap.width", "must not be negative")?;
                }
                if let Some(spring) = &circle.spring {
                    validate_spring(spring)?;
                }
                if let Some(shrink) = &circle.shrink {
                    validate_shrink(shrink)?;
                    require(shrink.floor > largest, "arena.shrink.floor", "must exceed the largest body radius")?;
                }
            }
            ArenaLayout::Rings(rings) => {
                require(rings.count > 0, "arena.count", "must be at least 1")?;
                require(rings.center.is_finite(), "arena.center", "must be finite")?;
                require(
                    rings.base_radius.is_finite() && rings.base_radius > largest,
                    "arena.base_radius",
                    "must exceed the largest body radius",
                )?;
                require(rings.gap_shift.is_finite(), "arena.gap_shift", "must be finite")?;
                require(rings.rotation_rate.is_finite(), "arena.rotation_rate", "must be finite")?;
                require(rings.stroke_width >= 0.0, "arena.stroke_width", "must not be negative")?;
                require(rings.spacing > 0.0, "arena.spacing", "rings must not overlap")?;
                require(rings.gap_width >= 0.0, "arena.gap_width", "must not be negative")?;
                require(
                    rings.color_period.0 > 0.0 && rings.color_period.0 <= rings.color_period.1,
                    "arena.color_period",
                    "must be a positive range",
                )?;
                if let Some(shrink) = &rings.shrink {
                    validate_shrink(shrink)?;
                    require(shrink.floor > largest, "arena.shrink.floor", "must exceed the largest body radius")?;
                }
            }
        }

        match &self.spawn {
            SpawnRule::None => {}
            SpawnRule::ChainOnFreeze {
                region,
                base_velocity,
                velocity_step,
            } => {
                require(
                    region.min.is_finite() && region.max.is_finite(),
                    "spawn.region",
                    "must be finite",
                )?;
                require(region.is_valid(), "spawn.region", "min must not exceed max")?;
                require(base_velocity.is_finite(), "spawn.base_velocity", "must be finite")?;
                require(velocity_step.is_finite(), "spawn.velocity_step", "must be finite")?;
                require(body.freeze_delay.is_some(), "bodies.freeze_delay", "chain spawning needs a freeze delay")?;
            }
            SpawnRule::SplitOnExit { center, offset, speed } => {
                require(center.is_finite(), "spawn.center", "must be finite")?;
                require(offset.is_finite(), "spawn.offset", "must be finite")?;
                require(speed.is_finite() && *speed >= 0.0, "spawn.speed", "must be finite and not negative")?;
            }
        }

        let particles = &self.particles;
        for (field, profile) in [
            ("particles.spark", &particles.spark),
            ("particles.flash", &particles.flash),
            ("particles.shard", &particles.shard),
        ] {
            require(profile.is_valid(), field, "lifetime/size ranges must be ordered and lifetime positive")?;
        }
        require(ordered(particles.pair_speed), "particles.pair_speed", "min must not exceed max")?;
        require(ordered(particles.ring_speed), "particles.ring_speed", "min must not exceed max")?;

        let audio = &self.audio;
        require(audio.effect_cooldown >= 0.0, "audio.effect_cooldown", "must not be negative")?;
        require(audio.effect_variations >= 1, "audio.effect_variations", "must be at least 1")?;
        require(audio.chord_epsilon > 0.0, "audio.chord_epsilon", "must be positive")?;

        Ok(())
    }
}

fn require(ok: bool, field: &'static str, reason: &str) -> Result<()> {
    if ok { Ok(()) } else { Err(ArenaError::invalid(field, reason)) }
}

fn ordered(range: (f32, f32)) -> bool {
    range.0 >= 0.0 && range.0 <= range.1
}

fn validate_spring(spring: &SpringSettings) -> Result<()> {
    require(spring.stiffness >= 0.0, "arena.spring.stiffness", "must not be negative")?;
    require(
        (0.0..=1.0).contains(&spring.damping),
        "arena.spring.damping",
        "must be within [0, 1]",
    )
}

fn validate_shrink(shrink: &ShrinkSettings) -> Result<()> {
    require(shrink.floor >= 0.0, "arena.shrink.floor", "must not be negative")?;
    require(shrink.factor >= 0.0, "arena.shrink.factor", "must not be negative")?;
    require(shrink.max_per_tick >= 0.0, "arena.shrink.max_per_tick", "must not be negative")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for variant in Variant::ALL {
            variant.settings().validate().unwrap();
        }
    }

    #[test]
    fn test_variant_round_trip() {
        for variant in Variant::ALL {
            assert_eq!(variant.as_str().parse::<Variant>().unwrap(), variant);
            assert_eq!(variant.to_string(), variant.as_str());
        }
        assert_eq!("RACE".parse::<Variant>().unwrap(), Variant::RingRace);
        assert!(matches!("bogus".parse::<Variant>(), Err(ArenaError::UnknownVariant(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings::ring_race();
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json_str(&json).unwrap(), settings);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json_str(r#"{ "gravity": 0.5 }"#).unwrap();
        assert_eq!(settings.gravity, 0.5);
        assert_eq!(settings.arena, Settings::freeze().arena);
    }

    #[test]
    fn test_rejects_zero_time_scale() {
        let mut settings = Settings::pulse();
        settings.bodies.time_scale = 0.0;
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ArenaError::InvalidSetting { field: "bodies.time_scale", .. }));
    }

    #[test]
    fn test_rejects_negative_radius() {
        let mut settings = Settings::freeze();
        settings.bodies.radius = -1.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_overlapping_rings() {
        let mut settings = Settings::ring_race();
        if let ArenaLayout::Rings(rings) = &mut settings.arena {
            rings.spacing = 0.0;
        }
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ArenaError::InvalidSetting { field: "arena.spacing", .. }));
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let mut settings = Settings::rotation();
        settings.particles.spark.lifetime = (80, 40);
        assert!(settings.validate().is_err());

        let mut settings = Settings::rotation();
        settings.bodies.max_time_scale = 0.1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_shrink_floor_inside_body() {
        let mut settings = Settings::pulse();
        if let ArenaLayout::Circle(circle) = &mut settings.arena {
            circle.shrink = Some(ShrinkSettings {
                floor: 0.0,
                factor: 0.05,
                max_per_tick: 5.0,
            });
        }
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ArenaError::InvalidSetting { field: "arena.shrink.floor", .. }));

        // Pulse bodies grow to 450, so the floor must clear that, not the start radius
        let mut settings = Settings::pulse();
        if let ArenaLayout::Circle(circle) = &mut settings.arena {
            circle.shrink = Some(ShrinkSettings {
                floor: 100.0,
                factor: 0.05,
                max_per_tick: 5.0,
            });
        }
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_growing_bodies_larger_than_first_ring() {
        let mut settings = Settings::ring_race();
        settings.bodies.growth = 1.0;
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ArenaError::InvalidSetting { field: "bodies.max_radius", .. }));

        settings.bodies.max_radius = Some(250.0);
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ArenaError::InvalidSetting { field: "arena.base_radius", .. }));
    }

    #[test]
    fn test_rejects_non_finite_inputs() {
        let mut settings = Settings::freeze();
        settings.bodies.initial.push(BodySeed {
            position: Vec2::new(f32::NAN, 100.0),
            velocity: Vec2::ZERO,
            team: 0,
        });
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ArenaError::InvalidSetting { field: "bodies.initial", .. }));

        let mut settings = Settings::freeze();
        if let SpawnRule::ChainOnFreeze { base_velocity, .. } = &mut settings.spawn {
            base_velocity.x = f32::NAN;
        }
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ArenaError::InvalidSetting { field: "spawn.base_velocity", .. }));

        let mut settings = Settings::rotation();
        settings.spawn = SpawnRule::SplitOnExit {
            center: Vec2::splat(540.0),
            offset: f32::INFINITY,
            speed: 30.0,
        };
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ArenaError::InvalidSetting { field: "spawn.offset", .. }));

        let mut settings = Settings::rotation();
        if let ArenaLayout::Circle(circle) = &mut settings.arena {
            circle.rotation_rate = f32::NAN;
        }
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_ring_radii() {
        let Settings {
            arena: ArenaLayout::Rings(rings),
            ..
        } = Settings::ring_race()
        else {
            panic!("ring race uses rings");
        };
        assert_eq!(rings.radius_of(0), 200.0);
        assert_eq!(rings.radius_of(2), 268.0);
        let max_active = rings.max_active_radius.unwrap();
        assert!((max_active - 1110.454).abs() < 1e-2);
    }

    #[test]
    fn test_shrink_delta_clamps() {
        let shrink = ShrinkSettings {
            floor: 200.0,
            factor: 0.01,
            max_per_tick: 5.0,
        };
        assert_eq!(shrink.delta(200.0), 0.0);
        assert_eq!(shrink.delta(150.0), 0.0);
        assert!((shrink.delta(300.0) - 1.0).abs() < 1e-5);
        assert_eq!(shrink.delta(2000.0), 5.0);
    }
}
