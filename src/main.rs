//! Chord Arena entry point
//!
//! Headless runner: builds an arena from a variant preset or a settings file,
//! plays an optional score through it and reports what happened.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use anyhow::{Context, Result};
    use clap::Parser;
    use std::path::PathBuf;

    use chord_arena::sim::{ArenaState, SimEvent, TickInput, tick};
    use chord_arena::{ArenaSnapshot, AudioLog, Score, Settings, Variant};

    #[derive(Parser, Debug, Clone)]
    #[command(author, version, about)]
    pub struct Args {
        /// Preset to run (freeze, pulse, rotation, ring-race)
        #[arg(long, default_value_t = Variant::Freeze)]
        pub variant: Variant,

        /// JSON settings file; overrides the variant preset
        #[arg(long)]
        pub settings: Option<PathBuf>,

        /// JSON score file (tracks of timed notes)
        #[arg(long)]
        pub score: Option<PathBuf>,

        /// RNG seed
        #[arg(long, default_value_t = 0)]
        pub seed: u64,

        /// Number of ticks to simulate
        #[arg(long, default_value_t = 3000)]
        pub ticks: u64,

        /// Frames per second fed to the engine clock
        #[arg(long, default_value_t = chord_arena::consts::FRAME_RATE)]
        pub fps: f64,

        /// Write the final snapshot as JSON to this path
        #[arg(long)]
        pub snapshot: Option<PathBuf>,

        /// Print the resolved settings as JSON and exit
        #[arg(long)]
        pub print_settings: bool,
    }

    #[derive(Debug, Default)]
    struct RunTotals {
        collisions: usize,
        rings: usize,
        spawned: usize,
        despawned: usize,
        notes: usize,
        effects: usize,
    }

    impl RunTotals {
        fn record(&mut self, events: &[SimEvent]) {
            for event in events {
                match event {
                    SimEvent::Collision(_) => self.collisions += 1,
                    SimEvent::RingDestroyed { .. } => self.rings += 1,
                    SimEvent::Spawned { .. } => self.spawned += 1,
                    SimEvent::Despawned { .. } => self.despawned += 1,
                    _ => {}
                }
            }
        }
    }

    pub fn run() -> Result<()> {
        let args = Args::parse();

        let settings = match &args.settings {
            Some(path) => Settings::load(path).with_context(|| format!("loading settings from {}", path.display()))?,
            None => args.variant.settings(),
        };

        if args.print_settings {
            println!("{}", settings.to_json()?);
            return Ok(());
        }

        anyhow::ensure!(args.fps.is_finite() && args.fps > 0.0, "--fps must be positive");

        let score = match &args.score {
            Some(path) => Score::load(path).with_context(|| format!("loading score from {}", path.display()))?,
            None => Score::default(),
        };
        log::info!("Score: {} notes over {:.2}s", score.len(), score.duration());

        let mut state = ArenaState::new(settings, score.into_events(), args.seed)?;
        let mut audio = AudioLog::new();
        let mut totals = RunTotals::default();
        let input = TickInput {
            elapsed: 1.0 / args.fps,
        };
        let ticks_per_second = args.fps.round().max(1.0) as u64;

        for _ in 0..args.ticks {
            tick(&mut state, &input, &mut audio);
            totals.record(&state.events);

            if state.time_ticks % ticks_per_second == 0 {
                totals.notes += audio.notes_started();
                totals.effects += audio.effects_played();
                audio.drain();
                log::info!(
                    "t={:.1}s bodies={} active={} rings={} particles={} score={}/{}",
                    state.clock,
                    state.bodies.len(),
                    state.active_count(),
                    state.boundaries.len(),
                    state.particles.len(),
                    state.sequencer.cursor(),
                    state.sequencer.len()
                );
            }
        }
        totals.notes += audio.notes_started();
        totals.effects += audio.effects_played();

        let label = match &args.settings {
            Some(path) => path.display().to_string(),
            None => args.variant.to_string(),
        };
        println!(
            "{} seed {} ({} ticks, {:.2}s): {} collisions, {} rings destroyed, {} spawned, {} despawned",
            label,
            state.seed,
            state.time_ticks,
            state.clock,
            totals.collisions,
            totals.rings,
            totals.spawned,
            totals.despawned
        );
        println!(
            "audio: {} notes started, {} effects, score {}/{} ({} left)",
            totals.notes,
            totals.effects,
            state.sequencer.cursor(),
            state.sequencer.len(),
            state.sequencer.remaining()
        );
        if state.settings.duration.is_some() {
            for (team, rings) in state.tally() {
                println!("team {}: {} rings", team, rings);
            }
            if let Some(left) = state.time_left() {
                println!("time left: {:.2}s", left);
            }
        }

        if let Some(path) = &args.snapshot {
            let snapshot = ArenaSnapshot::capture(&state);
            let json = serde_json::to_string_pretty(&snapshot)?;
            std::fs::write(path, json).with_context(|| format!("writing snapshot to {}", path.display()))?;
            log::info!("Snapshot written to {}", path.display());
        }

        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    cli::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
