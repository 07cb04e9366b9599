//! Deterministic simulation module
//!
//! All physics and sequencing lives here. This module must be pure and deterministic:
//! - One tick per frame; real time only feeds the engine clock
//! - Seeded RNG only
//! - Stable iteration order (bodies by id, boundaries by radius)
//! - No rendering or platform dependencies

pub mod body;
pub mod boundary;
pub mod collision;
pub mod gap;
pub mod particles;
pub mod sequencer;
pub mod state;
pub mod tick;

pub use body::{Body, BodyState, TrailPoint};
pub use boundary::{Boundary, BoundaryContact, ColorCycle, Spring};
pub use collision::{
    CollisionEvent, ContactKind, Disc, PairResolution, WallContact, bounce_off_obstacle, bounce_off_wall,
    exchange_normal_velocity, reflect_velocity, resolve_elastic_pair, wall_contact,
};
pub use gap::{GapGeometry, SolidArc};
pub use particles::{Particle, ParticleField, ParticleProfile, ParticleStyle};
pub use sequencer::{Chord, Cooldown, EventSequencer, Note};
pub use state::{ArenaState, SimEvent};
pub use tick::{TickInput, tick};
