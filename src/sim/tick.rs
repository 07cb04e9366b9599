//! Simulation tick
//!
//! One call advances the arena by one frame. Order within a tick:
//! boundaries move, bodies integrate and hit walls, body pairs resolve,
//! freezes apply, traversed rings break and the rest shrink, exits split,
//! then every collision is dispatched (sound + particles) in the order it
//! happened. Particles age last; off-screen exits are dropped and the freeze
//! chain is topped up.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::body::{Body, BodyState};
use super::boundary::BoundaryContact;
use super::collision::{CollisionEvent, ContactKind, bounce_off_obstacle, resolve_elastic_pair};
use super::particles::ParticleStyle;
use super::state::{ArenaState, SimEvent};
use crate::audio::{AudioSink, SoundEffect};
use crate::consts::FRAME_DT;
use crate::settings::{ChordOwnership, SoundTrigger, SpawnRule};

/// Per-tick input
#[derive(Debug, Clone, Copy)]
pub struct TickInput {
    /// Real seconds since the previous tick; drives the engine clock
    /// (freeze delays, cooldowns, color cycles, match time)
    pub elapsed: f64,
}

impl Default for TickInput {
    fn default() -> Self {
        Self { elapsed: FRAME_DT }
    }
}

/// A ring removed this tick, captured before removal for the shard burst
#[derive(Debug, Clone, Copy)]
struct RingBreak {
    boundary: u32,
    by: u32,
    center: Vec2,
    radius: f32,
    color_phase: f32,
}

/// Advance the arena by one tick
pub fn tick(state: &mut ArenaState, input: &TickInput, audio: &mut dyn AudioSink) {
    state.events.clear();
    state.time_ticks += 1;
    if input.elapsed.is_finite() && input.elapsed > 0.0 {
        state.clock += input.elapsed;
    }
    let now = state.clock;

    for boundary in state.boundaries.iter_mut() {
        boundary.advance(now);
    }

    let mut contacts = Vec::new();
    let mut escapes = Vec::new();
    let exits = integrate_bodies(state, &mut contacts, &mut escapes);

    if state.settings.collisions.pair_collisions {
        resolve_pairs(state, &mut contacts);
    }

    apply_freezes(state);

    let breaks = break_rings(state, escapes);
    shrink_boundaries(state);

    for _ in 0..exits {
        state.spawn_split_pair();
    }

    for contact in &contacts {
        dispatch_contact(state, contact, audio);
    }
    for ring in &breaks {
        dispatch_ring_break(state, ring, audio);
    }

    state.particles.tick();

    despawn_exited(state, audio);

    if matches!(state.settings.spawn, SpawnRule::ChainOnFreeze { .. })
        && state.bodies.last().is_none_or(|b| !b.is_active())
    {
        state.spawn_chain_body();
    }
}

/// Move every body and test active ones against the boundaries.
///
/// Rings are tested from the largest radius down and a body stops at the
/// first one it touches. Returns the number of bodies that exited.
fn integrate_bodies(
    state: &mut ArenaState,
    contacts: &mut Vec<CollisionEvent>,
    escapes: &mut Vec<(u32, u32)>,
) -> usize {
    let gravity = state.settings.gravity;
    let hue_speed = state.settings.hue_speed;
    let body_settings = &state.settings.bodies;
    let min_bounce = body_settings.min_bounce.as_ref();
    let mut exits = 0;

    for body in state.bodies.iter_mut() {
        match body.state {
            BodyState::Frozen => {
                body.integrate(gravity);
                continue;
            }
            BodyState::Exited => {
                body.integrate(gravity);
                body.advance_hue(hue_speed);
                continue;
            }
            BodyState::Active => {}
        }

        body.integrate(gravity);
        body.record_trail();

        for boundary in state.boundaries.iter_mut().rev() {
            if !boundary.collidable() {
                continue;
            }
            match boundary.resolve(body, min_bounce) {
                BoundaryContact::Clear => continue,
                BoundaryContact::Escaped { .. } if boundary.destructible => {
                    escapes.push((boundary.id, body.id));
                }
                BoundaryContact::Escaped { angle } => {
                    body.exit();
                    exits += 1;
                    state.events.push(SimEvent::Escaped {
                        body: body.id,
                        boundary: boundary.id,
                    });
                    // Screen space: the outward direction at `angle` has -y for up
                    let outward = Vec2::new(angle.cos(), -angle.sin());
                    contacts.push(CollisionEvent {
                        body: body.id,
                        kind: ContactKind::Escape { boundary: boundary.id },
                        point: boundary.center + outward * boundary.radius,
                        normal: -outward,
                        impact_velocity: body.vel,
                    });
                    log::debug!("Body {} escaped boundary {}", body.id, boundary.id);
                }
                BoundaryContact::Bounced(event) => {
                    body.on_bounce(body_settings);
                    contacts.push(event);
                }
            }
            break;
        }

        body.advance_hue(hue_speed);
    }

    exits
}

/// Resolve every overlapping pair with at least one active member
fn resolve_pairs(state: &mut ArenaState, contacts: &mut Vec<CollisionEvent>) {
    let require_approach = state.settings.collisions.require_approach;
    let count = state.bodies.len();

    for i in 0..count {
        for j in (i + 1)..count {
            let (left, right) = state.bodies.split_at_mut(j);
            let a = &mut left[i];
            let b = &mut right[0];

            match (a.state, b.state) {
                (BodyState::Active, BodyState::Active) => {
                    let impact_velocity = a.vel;
                    let Some(res) = resolve_elastic_pair(a.disc(), b.disc(), require_approach) else {
                        continue;
                    };
                    a.apply_disc(&res.a);
                    b.apply_disc(&res.b);
                    if res.exchanged {
                        contacts.push(CollisionEvent {
                            body: a.id,
                            kind: ContactKind::Pair { other: b.id },
                            point: res.midpoint(),
                            normal: -res.normal,
                            impact_velocity,
                        });
                    }
                }
                (BodyState::Active, BodyState::Frozen) => {
                    if let Some(event) = bounce_mover(a, b) {
                        contacts.push(event);
                    }
                }
                (BodyState::Frozen, BodyState::Active) => {
                    if let Some(event) = bounce_mover(b, a) {
                        contacts.push(event);
                    }
                }
                _ => {}
            }
        }
    }
}

fn bounce_mover(mover: &mut Body, obstacle: &Body) -> Option<CollisionEvent> {
    let impact_velocity = mover.vel;
    let obstacle_disc = obstacle.disc();
    let (moved, normal) = bounce_off_obstacle(mover.disc(), &obstacle_disc)?;
    mover.apply_disc(&moved);
    Some(CollisionEvent {
        body: mover.id,
        kind: ContactKind::Obstacle { obstacle: obstacle.id },
        point: (moved.pos + obstacle_disc.pos) * 0.5,
        normal,
        impact_velocity,
    })
}

fn apply_freezes(state: &mut ArenaState) {
    let Some(delay) = state.settings.bodies.freeze_delay else {
        return;
    };
    let now = state.clock;
    for body in state.bodies.iter_mut() {
        if body.should_freeze(now, delay) {
            body.freeze();
            state.events.push(SimEvent::Frozen { body: body.id });
            log::debug!("Body {} froze at {:.2}s", body.id, now);
        }
    }
}

/// Remove every ring a body passed through this tick and credit the body.
///
/// Escapes seen during wall resolution are combined with a sweep of all
/// collidable rings against the final body positions; the first body (by
/// id) found outside a ring's gap gets the credit.
fn break_rings(state: &mut ArenaState, mut escapes: Vec<(u32, u32)>) -> Vec<RingBreak> {
    for boundary in state.boundaries.iter() {
        if !boundary.destructible || !boundary.collidable() {
            continue;
        }
        if escapes.iter().any(|&(ring, _)| ring == boundary.id) {
            continue;
        }
        if let Some(body) = state
            .bodies
            .iter()
            .find(|b| b.is_active() && boundary.is_escaping(b))
        {
            escapes.push((boundary.id, body.id));
        }
    }

    if escapes.is_empty() {
        return Vec::new();
    }

    let mut breaks: Vec<RingBreak> = Vec::with_capacity(escapes.len());
    for boundary in state.boundaries.iter() {
        let credited = escapes
            .iter()
            .filter(|&&(ring, _)| ring == boundary.id)
            .map(|&(_, body)| body)
            .min();
        if let Some(by) = credited {
            breaks.push(RingBreak {
                boundary: boundary.id,
                by,
                center: boundary.center,
                radius: boundary.radius,
                color_phase: boundary.color_phase,
            });
        }
    }

    state
        .boundaries
        .retain(|b| !breaks.iter().any(|ring| ring.boundary == b.id));

    for ring in &breaks {
        if let Ok(index) = state.bodies.binary_search_by_key(&ring.by, |b| b.id) {
            state.bodies[index].rings_cleared += 1;
        }
        state.rings_destroyed += 1;
        state.events.push(SimEvent::RingDestroyed {
            boundary: ring.boundary,
            by: ring.by,
        });
        log::debug!("Ring {} destroyed by body {}", ring.boundary, ring.by);
    }

    breaks
}

/// Pull every boundary inward toward the configured floor
fn shrink_boundaries(state: &mut ArenaState) {
    let Some(shrink) = state.settings.arena.shrink() else {
        return;
    };
    let Some(current_min) = state.boundaries.iter().map(|b| b.radius).reduce(f32::min) else {
        return;
    };

    let delta = shrink.delta(current_min);
    if delta > 0.0 {
        for boundary in state.boundaries.iter_mut() {
            boundary.shrink_by(delta);
        }
    }
}

/// Particles and sound for one collision
fn dispatch_contact(state: &mut ArenaState, contact: &CollisionEvent, audio: &mut dyn AudioSink) {
    state.events.push(SimEvent::Collision(*contact));

    let particles = state.settings.particles;
    let trigger = match contact.kind {
        ContactKind::Boundary { .. } => {
            if let Some(body) = state.body(contact.body) {
                let (pos, hue) = (body.pos, body.hue);
                state.particles.spawn(
                    &mut state.rng,
                    pos,
                    contact.impact_velocity * particles.bounce_bias,
                    particles.bounce_count,
                    ParticleStyle::Spark,
                    &particles.spark,
                    hue,
                );
            }
            state.settings.audio.wall
        }
        ContactKind::Pair { .. } | ContactKind::Obstacle { .. } => {
            state.particles.spawn_burst(
                &mut state.rng,
                contact.point,
                particles.pair_count,
                particles.pair_speed,
                ParticleStyle::Flash,
                &particles.flash,
                0.0,
            );
            state.settings.audio.pair
        }
        ContactKind::Escape { .. } => {
            let hue = state.body(contact.body).map_or(0.0, |b| b.hue);
            state.particles.spawn(
                &mut state.rng,
                contact.point,
                contact.impact_velocity * particles.bounce_bias,
                particles.escape_count,
                ParticleStyle::Spark,
                &particles.spark,
                hue,
            );
            state.settings.audio.escape
        }
    };

    match trigger {
        SoundTrigger::Silent => {}
        SoundTrigger::Chord => trigger_chord(state, contact.body, audio),
        SoundTrigger::Effect => {
            let kind = contact.kind;
            play_effect(state, audio, |rng, variations| {
                let variation = rng.random_range(0..variations);
                match kind {
                    ContactKind::Boundary { .. } => SoundEffect::WallBounce { variation },
                    ContactKind::Escape { .. } => SoundEffect::Escape { variation },
                    ContactKind::Pair { .. } | ContactKind::Obstacle { .. } => {
                        SoundEffect::BodyBounce { variation }
                    }
                }
            });
        }
    }
}

/// Shard burst and sound for one destroyed ring
fn dispatch_ring_break(state: &mut ArenaState, ring: &RingBreak, audio: &mut dyn AudioSink) {
    let particles = state.settings.particles;
    state.particles.spawn_ring(
        &mut state.rng,
        ring.center,
        ring.radius,
        particles.ring_count,
        particles.ring_speed,
        ParticleStyle::Shard,
        &particles.shard,
        ring.color_phase,
    );

    match state.settings.audio.ring {
        SoundTrigger::Silent => {}
        SoundTrigger::Chord => trigger_chord(state, ring.by, audio),
        SoundTrigger::Effect => {
            let team = state.body(ring.by).map_or(0, |b| b.team);
            play_effect(state, audio, |_, _| SoundEffect::RingShatter { team });
        }
    }
}

/// Stop the held chord and start the next one, honoring the body's cooldown
fn trigger_chord(state: &mut ArenaState, body_id: u32, audio: &mut dyn AudioSink) {
    let now = state.clock;
    let Ok(index) = state.bodies.binary_search_by_key(&body_id, |b| b.id) else {
        return;
    };
    let body = &mut state.bodies[index];
    if !body.note_cooldown.ready(now) {
        return;
    }

    let held = match state.settings.audio.chord_ownership {
        ChordOwnership::PerBody => &mut body.chord,
        ChordOwnership::Shared => &mut state.shared_chord,
    };
    let was_holding = !held.is_empty();
    let was_exhausted = state.sequencer.is_exhausted();

    let started = state.sequencer.trigger(held, audio);

    if was_holding {
        state.events.push(SimEvent::ChordStopped { body: body_id });
    }
    if started > 0 {
        state.events.push(SimEvent::ChordStarted {
            body: body_id,
            notes: held.notes().to_vec(),
        });
        body.note_cooldown.mark(now);
        if !was_exhausted && state.sequencer.is_exhausted() {
            state.events.push(SimEvent::ScoreExhausted);
        }
    }
}

/// Fire an effect if the global cooldown allows it.
///
/// `pick` only runs when the effect actually plays, so rate-limited
/// collisions do not consume randomness.
fn play_effect<F>(state: &mut ArenaState, audio: &mut dyn AudioSink, pick: F)
where
    F: FnOnce(&mut Pcg32, u8) -> SoundEffect,
{
    if !state.effect_cooldown.try_fire(state.clock) {
        return;
    }
    let effect = pick(&mut state.rng, state.settings.audio.effect_variations);
    log::trace!("Effect {:?}", effect);
    audio.play(effect);
    state.events.push(SimEvent::Effect(effect));
}

/// Drop exited bodies whose circle left the despawn rectangle
fn despawn_exited(state: &mut ArenaState, audio: &mut dyn AudioSink) {
    let Some(bounds) = state.settings.bodies.despawn_bounds else {
        return;
    };
    let events = &mut state.events;
    state.bodies.retain(|body| {
        let gone = body.is_exited() && body.is_outside(&bounds);
        if gone {
            if !body.chord.is_empty() {
                audio.stop_chord(&body.chord);
            }
            events.push(SimEvent::Despawned { body: body.id });
            log::debug!("Body {} despawned", body.id);
        }
        !gone
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioCall, AudioLog, Silence};
    use crate::score::NoteEvent;
    use crate::settings::{ArenaLayout, BodySeed, CircleSettings, Settings, Variant};

    fn notes(times: &[f64]) -> Vec<NoteEvent> {
        times
            .iter()
            .enumerate()
            .map(|(i, &time)| NoteEvent {
                time,
                pitch: 60 + i as u8,
                velocity: 100,
                channel: 0,
            })
            .collect()
    }

    /// A closed circle of radius 100 at the origin with one body, no gravity
    fn closed_circle(body_pos: Vec2, body_vel: Vec2) -> Settings {
        let mut settings = Settings::pulse();
        settings.gravity = 0.0;
        settings.arena = ArenaLayout::Circle(CircleSettings {
            center: Vec2::ZERO,
            radius: 100.0,
            stroke_width: 2.0,
            gap: None,
            rotation_rate: 0.0,
            spring: None,
            shrink: None,
        });
        settings.bodies.radius = 10.0;
        settings.bodies.growth = 0.0;
        settings.bodies.max_radius = None;
        settings.bodies.time_scale = 1.0;
        settings.bodies.max_time_scale = 1.0;
        settings.bodies.time_accel = 1.0;
        settings.bodies.initial = vec![BodySeed {
            position: body_pos,
            velocity: body_vel,
            team: 0,
        }];
        settings
    }

    #[test]
    fn test_wall_bounce_lands_on_limit_circle() {
        let settings = closed_circle(Vec2::new(0.0, 90.0), Vec2::new(0.0, 5.0));
        let mut state = ArenaState::new(settings, Vec::new(), 1).unwrap();
        tick(&mut state, &TickInput::default(), &mut Silence);

        let body = &state.bodies[0];
        assert!((body.pos.length() - 90.0).abs() < 1e-4);
        assert!((body.vel - Vec2::new(0.0, -5.0)).length() < 1e-5);
        assert!(matches!(state.events[0], SimEvent::Collision(_)));
    }

    #[test]
    fn test_wall_bounce_plays_chord_and_sparks() {
        let settings = closed_circle(Vec2::new(0.0, 90.0), Vec2::new(0.0, 5.0));
        let mut state = ArenaState::new(settings, notes(&[0.0, 0.0, 0.5]), 1).unwrap();
        let mut audio = AudioLog::default();
        tick(&mut state, &TickInput::default(), &mut audio);

        assert_eq!(audio.calls().len(), 1);
        assert!(matches!(&audio.calls()[0], AudioCall::Start(c) if c.len() == 2));
        assert_eq!(state.sequencer.cursor(), 2);
        assert_eq!(state.bodies[0].chord.len(), 2);
        assert!(state.particles.len() > 0);
    }

    #[test]
    fn test_clock_ignores_bad_elapsed() {
        let settings = closed_circle(Vec2::ZERO, Vec2::ZERO);
        let mut state = ArenaState::new(settings, Vec::new(), 1).unwrap();
        tick(&mut state, &TickInput { elapsed: -1.0 }, &mut Silence);
        tick(&mut state, &TickInput { elapsed: f64::NAN }, &mut Silence);
        assert_eq!(state.clock, 0.0);
        tick(&mut state, &TickInput { elapsed: 0.25 }, &mut Silence);
        assert_eq!(state.clock, 0.25);
        assert_eq!(state.time_ticks, 3);
    }

    #[test]
    fn test_freeze_chain_continues() {
        let mut state = ArenaState::from_variant(Variant::Freeze, Vec::new(), 5).unwrap();
        let input = TickInput { elapsed: 0.5 };
        for _ in 0..6 {
            tick(&mut state, &input, &mut Silence);
        }
        // 3 s elapsed: the first body froze and a second one spawned
        assert!(state.bodies[0].is_frozen() || state.bodies[0].is_exited());
        assert!(state.bodies.len() >= 2);
        assert!(state.bodies.last().unwrap().is_active());
    }

    #[test]
    fn test_determinism() {
        let mut a = ArenaState::from_variant(Variant::Rotation, Vec::new(), 99).unwrap();
        let mut b = ArenaState::from_variant(Variant::Rotation, Vec::new(), 99).unwrap();
        let input = TickInput::default();

        for _ in 0..600 {
            tick(&mut a, &input, &mut Silence);
            tick(&mut b, &input, &mut Silence);
        }

        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.bodies.len(), b.bodies.len());
        for (x, y) in a.bodies.iter().zip(&b.bodies) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.vel, y.vel);
        }
        assert_eq!(a.particles.len(), b.particles.len());
    }
}
