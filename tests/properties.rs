//! Geometric and sequencing properties over random inputs

use glam::Vec2;
use proptest::prelude::*;

use chord_arena::polar_to_cartesian;
use chord_arena::score::{Track, TrackNote};
use chord_arena::settings::BodySettings;
use chord_arena::sim::{
    Body, Boundary, BoundaryContact, Chord, Disc, EventSequencer, GapGeometry, resolve_elastic_pair,
};
use chord_arena::{AudioCall, AudioLog, NoteEvent, Score};

const EPS: f32 = 1e-3;

fn arb_angle() -> impl Strategy<Value = f32> {
    -10.0..10.0_f32
}

fn arb_velocity() -> impl Strategy<Value = Vec2> {
    (-50.0..50.0_f32, -50.0..50.0_f32).prop_map(|(x, y)| Vec2::new(x, y))
}

fn kinetic(v: Vec2) -> f32 {
    0.5 * v.length_squared()
}

fn arb_score() -> impl Strategy<Value = Vec<NoteEvent>> {
    prop::collection::vec((0u32..200, 40u8..90), 0..40).prop_map(|mut raw| {
        raw.sort();
        raw.into_iter()
            .map(|(ticks, pitch)| NoteEvent {
                time: f64::from(ticks) * 0.05,
                pitch,
                velocity: 100,
                channel: 0,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn gap_and_wall_partition_the_circle(
        center in arb_angle(),
        width in 0.0..7.0_f32,
        theta in arb_angle(),
    ) {
        let gap = GapGeometry::new(center, width);
        prop_assert!(gap.contains(theta) != gap.on_wall(theta),
            "theta {} in gap {:?}: contains={} on_wall={}",
            theta, gap, gap.contains(theta), gap.on_wall(theta));
    }

    #[test]
    fn closed_wall_bounce_keeps_speed_and_lands_on_limit(
        wall_radius in 100.0..500.0_f32,
        body_radius in 5.0..50.0_f32,
        angle in arb_angle(),
        overshoot in 0.01..20.0_f32,
        vel in arb_velocity(),
    ) {
        let settings = BodySettings { radius: body_radius, ..BodySettings::default() };
        let limit = wall_radius - body_radius;
        let pos = polar_to_cartesian(limit + overshoot, angle);
        let mut body = Body::new(1, pos, vel, &settings, 0.0);
        let mut wall = Boundary::new(0, Vec2::ZERO, wall_radius, 2.0);

        let contact = wall.resolve(&mut body, None);
        prop_assert!(matches!(contact, BoundaryContact::Bounced(_)));
        prop_assert!((body.pos.length() - limit).abs() < EPS * 10.0,
            "landed at {} instead of {}", body.pos.length(), limit);
        prop_assert!((body.vel.length() - vel.length()).abs() < EPS,
            "speed {} -> {}", vel.length(), body.vel.length());
    }

    #[test]
    fn elastic_pair_conserves_momentum_and_energy(
        distance in 1.0..19.0_f32,
        angle in arb_angle(),
        va in arb_velocity(),
        vb in arb_velocity(),
    ) {
        let a = Disc {
            pos: Vec2::ZERO,
            vel: va,
            radius: 10.0,
        };
        let b = Disc {
            pos: polar_to_cartesian(distance, angle),
            vel: vb,
            radius: 10.0,
        };

        let res = resolve_elastic_pair(a, b, false).unwrap();
        prop_assert!(res.exchanged);

        let momentum_before = va + vb;
        let momentum_after = res.a.vel + res.b.vel;
        prop_assert!((momentum_before - momentum_after).length() < EPS * 10.0);

        let energy_before = kinetic(va) + kinetic(vb);
        let energy_after = kinetic(res.a.vel) + kinetic(res.b.vel);
        prop_assert!((energy_before - energy_after).abs() <= energy_before.max(1.0) * EPS,
            "energy {} -> {}", energy_before, energy_after);

        prop_assert!(res.a.pos.distance(res.b.pos) >= 20.0 - EPS);
    }

    #[test]
    fn sequencer_cursor_only_moves_forward(score in arb_score(), triggers in 0usize..60) {
        let len = score.len();
        let mut sequencer = EventSequencer::new(score);
        let mut held = Chord::default();
        let mut audio = AudioLog::new();
        let mut last = sequencer.cursor();

        for _ in 0..triggers {
            let was_exhausted = sequencer.is_exhausted();
            let starts_before = audio.calls().iter().filter(|c| matches!(c, AudioCall::Start(_))).count();
            let started = sequencer.trigger(&mut held, &mut audio);
            let starts_after = audio.calls().iter().filter(|c| matches!(c, AudioCall::Start(_))).count();

            prop_assert!(sequencer.cursor() >= last);
            prop_assert!(sequencer.cursor() <= len);
            if was_exhausted {
                prop_assert_eq!(started, 0);
                prop_assert_eq!(starts_before, starts_after);
                prop_assert!(held.is_empty());
            } else {
                prop_assert_eq!(started, sequencer.cursor() - last);
                prop_assert_eq!(held.len(), started);
            }
            last = sequencer.cursor();
        }

        prop_assert_eq!(audio.notes_started(), sequencer.cursor());
    }

    #[test]
    fn flattened_score_is_ordered(
        tracks in prop::collection::vec(
            prop::collection::vec((0.0..30.0_f64, 0u8..128), 0..20),
            0..6,
        ),
    ) {
        let tracks: Vec<Track> = tracks
            .into_iter()
            .map(|notes| Track {
                program: 0,
                notes: notes
                    .into_iter()
                    .map(|(start, pitch)| TrackNote { start, pitch, velocity: 90 })
                    .collect(),
            })
            .collect();
        let total: usize = tracks.iter().map(|t| t.notes.len()).sum();

        let score = Score::from_tracks(&tracks).unwrap();
        prop_assert_eq!(score.len(), total);
        prop_assert_eq!(score.programs.len(), tracks.len());
        for pair in score.notes().windows(2) {
            prop_assert!(pair[0].time < pair[1].time
                || (pair[0].time == pair[1].time && pair[0].pitch <= pair[1].pitch));
        }
    }
}
