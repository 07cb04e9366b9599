//! Audio collaborator interface
//!
//! The simulation never produces sound itself. It tells an [`AudioSink`]
//! which chords to start and stop and which effects to fire; a MIDI output,
//! a sample player or a test recorder sits on the other side.

use serde::{Deserialize, Serialize};

use crate::sim::sequencer::Chord;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Body bounced off a boundary wall (`variation` picks one of several samples)
    WallBounce { variation: u8 },
    /// Two bodies collided
    BodyBounce { variation: u8 },
    /// A ring was destroyed by a body of the given team
    RingShatter { team: u8 },
    /// A body left the arena through a gap
    Escape { variation: u8 },
}

impl SoundEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundEffect::WallBounce { .. } => "wall-bounce",
            SoundEffect::BodyBounce { .. } => "body-bounce",
            SoundEffect::RingShatter { .. } => "ring-shatter",
            SoundEffect::Escape { .. } => "escape",
        }
    }
}

/// Receiver for everything audible the simulation does
pub trait AudioSink {
    /// Begin sounding every note of `chord`
    fn start_chord(&mut self, chord: &Chord);
    /// Silence every note of `chord`
    fn stop_chord(&mut self, chord: &Chord);
    /// Fire-and-forget sound effect
    fn play(&mut self, effect: SoundEffect);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct Silence;

impl AudioSink for Silence {
    fn start_chord(&mut self, _chord: &Chord) {}
    fn stop_chord(&mut self, _chord: &Chord) {}
    fn play(&mut self, _effect: SoundEffect) {}
}

/// One call received by an [`AudioLog`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCall {
    Start(Chord),
    Stop(Chord),
    Effect(SoundEffect),
}

/// Records every call in order (headless runs and tests)
#[derive(Debug, Clone, Default)]
pub struct AudioLog {
    calls: Vec<AudioCall>,
}

impl AudioLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[AudioCall] {
        &self.calls
    }

    /// Number of notes started so far
    pub fn notes_started(&self) -> usize {
        self.calls
            .iter()
            .map(|call| match call {
                AudioCall::Start(chord) => chord.len(),
                _ => 0,
            })
            .sum()
    }

    /// Number of effects fired so far
    pub fn effects_played(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, AudioCall::Effect(_)))
            .count()
    }

    /// Take the recorded calls, leaving the log empty
    pub fn drain(&mut self) -> Vec<AudioCall> {
        std::mem::take(&mut self.calls)
    }

}

impl AudioSink for AudioLog {
    fn start_chord(&mut self, chord: &Chord) {
        log::trace!("start chord ({} notes)", chord.len());
        self.calls.push(AudioCall::Start(chord.clone()));
    }

    fn stop_chord(&mut self, chord: &Chord) {
        log::trace!("stop chord ({} notes)", chord.len());
        self.calls.push(AudioCall::Stop(chord.clone()));
    }

    fn play(&mut self, effect: SoundEffect) {
        log::trace!("effect {}", effect.as_str());
        self.calls.push(AudioCall::Effect(effect));
    }
}
