//! Collision-driven note sequencing
//!
//! The score is a pre-sorted list of note onsets. Every collision pulls the
//! next chord (all onsets within epsilon of the one under the cursor) and the
//! cursor only ever moves forward. Whoever owns a chord is responsible for
//! stopping it before starting the next one.

use serde::{Deserialize, Serialize};

use crate::audio::AudioSink;
use crate::consts::CHORD_EPSILON;
use crate::score::NoteEvent;

/// One sounding note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub pitch: u8,
    pub velocity: u8,
    pub channel: u8,
}

impl From<&NoteEvent> for Note {
    fn from(event: &NoteEvent) -> Self {
        Self {
            pitch: event.pitch,
            velocity: event.velocity,
            channel: event.channel,
        }
    }
}

/// A group of simultaneous notes. Empty means "nothing sounding".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    notes: Vec<Note>,
}

impl Chord {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Forward-only cursor over the score
#[derive(Debug, Clone)]
pub struct EventSequencer {
    entries: Vec<NoteEvent>,
    cursor: usize,
    epsilon: f64,
    chords_played: usize,
}

impl Default for EventSequencer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl EventSequencer {
    /// Wrap an already-sorted note list. Ordering is the loader's job; an
    /// unsorted list is played as given.
    pub fn new(entries: Vec<NoteEvent>) -> Self {
        if !entries.is_sorted_by(|a, b| a.time <= b.time) {
            log::warn!("score entries are not sorted by onset; playing them in the given order");
        }
        Self {
            entries,
            cursor: 0,
            epsilon: CHORD_EPSILON,
            chords_played: 0,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.entries.len() - self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.entries.len()
    }

    pub fn chords_played(&self) -> usize {
        self.chords_played
    }

    /// Take the chord under the cursor and move past it.
    ///
    /// Returns `None` once the score is exhausted.
    pub fn next_chord(&mut self) -> Option<Chord> {
        let first = self.entries.get(self.cursor)?;
        let onset = first.time;

        let end = self.entries[self.cursor..]
            .iter()
            .position(|e| (e.time - onset).abs() >= self.epsilon)
            .map_or(self.entries.len(), |offset| self.cursor + offset);

        let chord = Chord::new(self.entries[self.cursor..end].iter().map(Note::from).collect());
        self.cursor = end;
        self.chords_played += 1;

        if self.is_exhausted() {
            log::info!("score exhausted after {} chords", self.chords_played);
        }
        Some(chord)
    }

    /// Handle one collision for a chord owner.
    ///
    /// Stops whatever `held` is sounding, starts the next chord if there is
    /// one and stores it in `held`. Returns the number of notes started.
    pub fn trigger(&mut self, held: &mut Chord, sink: &mut dyn AudioSink) -> usize {
        if !held.is_empty() {
            sink.stop_chord(held);
            *held = Chord::default();
        }

        match self.next_chord() {
            Some(chord) => {
                log::trace!("chord {} at cursor {}: {} notes", self.chords_played, self.cursor, chord.len());
                sink.start_chord(&chord);
                let started = chord.len();
                *held = chord;
                started
            }
            None => 0,
        }
    }
}

/// Minimum interval between two triggers from the same source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cooldown {
    /// Seconds that must elapse between triggers (0 = no limit)
    pub interval: f64,
    last: Option<f64>,
}

impl Cooldown {
    pub fn new(interval: f64) -> Self {
        Self { interval, last: None }
    }

    /// True if a trigger at `now` is allowed
    pub fn ready(&self, now: f64) -> bool {
        match self.last {
            Some(last) => now - last >= self.interval,
            None => true,
        }
    }

    /// Record a trigger at `now`
    pub fn mark(&mut self, now: f64) {
        self.last = Some(now);
    }

    /// Check and record in one step
    pub fn try_fire(&mut self, now: f64) -> bool {
        if self.ready(now) {
            self.mark(now);
            true
        } else {
            false
        }
    }
}
