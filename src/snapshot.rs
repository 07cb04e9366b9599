//! Read-only render views
//!
//! A snapshot is taken after a tick completes and never feeds back into the
//! simulation. Renderers draw from it; the headless runner dumps it as JSON.

use glam::Vec2;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::sim::{ArenaState, BodyState, ParticleStyle, SolidArc};

#[derive(Debug, Clone, Serialize)]
pub struct BoundaryView {
    pub id: u32,
    pub center: Vec2,
    pub radius: f32,
    pub stroke_width: f32,
    /// Opening as (start, end) angles; `start > end` wraps across 0
    pub gap: Option<(f32, f32)>,
    pub solid_arcs: Vec<SolidArc>,
    pub color_phase: f32,
    /// False for rings beyond the active radius
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BodyView {
    pub id: u32,
    pub pos: Vec2,
    pub prev_pos: Vec2,
    pub radius: f32,
    pub state: BodyState,
    pub hue: f32,
    pub team: u8,
    pub rings_cleared: u32,
    /// Ghost positions, newest first
    pub trail: Vec<Vec2>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParticleView {
    pub pos: Vec2,
    pub size: f32,
    /// Remaining life in (0, 1]
    pub life: f32,
    pub style: ParticleStyle,
    pub hue: f32,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct ArenaSnapshot {
    pub tick: u64,
    pub clock: f64,
    pub boundaries: Vec<BoundaryView>,
    pub bodies: Vec<BodyView>,
    pub particles: Vec<ParticleView>,
    /// Rings destroyed per team
    pub tally: BTreeMap<u8, u32>,
    pub time_left: Option<f64>,
    pub score_cursor: usize,
    pub score_len: usize,
}

impl ArenaSnapshot {
    pub fn capture(state: &ArenaState) -> Self {
        let boundaries = state
            .boundaries
            .iter()
            .map(|b| BoundaryView {
                id: b.id,
                center: b.center,
                radius: b.radius,
                stroke_width: b.stroke_width,
                gap: b.gap.interval(),
                solid_arcs: b.solid_arcs(),
                color_phase: b.color_phase,
                visible: b.collidable(),
            })
            .collect();

        let bodies = state
            .bodies
            .iter()
            .map(|b| BodyView {
                id: b.id,
                pos: b.pos,
                prev_pos: b.prev_pos,
                radius: b.radius,
                state: b.state,
                hue: b.hue,
                team: b.team,
                rings_cleared: b.rings_cleared,
                trail: b.trail.iter().map(|t| t.pos).collect(),
            })
            .collect();

        let particles = state
            .particles
            .iter()
            .map(|p| ParticleView {
                pos: p.pos,
                size: p.size,
                life: p.life_fraction(),
                style: p.style,
                hue: p.hue,
            })
            .collect();

        Self {
            tick: state.time_ticks,
            clock: state.clock,
            boundaries,
            bodies,
            particles,
            tally: state.tally(),
            time_left: state.time_left(),
            score_cursor: state.sequencer.cursor(),
            score_len: state.sequencer.len(),
        }
    }

    /// Boundaries a renderer should draw
    pub fn visible_boundaries(&self) -> impl Iterator<Item = &BoundaryView> {
        self.boundaries.iter().filter(|b| b.visible)
    }
}
