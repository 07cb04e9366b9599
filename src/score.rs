//! Score loading
//!
//! Turns per-track note lists into the flat, onset-ordered sequence the
//! sequencer consumes. Decoding actual MIDI files is left to the caller; the
//! JSON shape here is what a converter would emit:
//!
//! ```json
//! { "tracks": [ { "program": 0, "notes": [ { "start": 0.0, "pitch": 60, "velocity": 90 } ] } ] }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ArenaError, Result};

/// One note onset in the flattened score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Onset in seconds, rounded to milliseconds
    pub time: f64,
    pub pitch: u8,
    pub velocity: u8,
    /// Output channel (the index of the source track)
    pub channel: u8,
}

/// A note as written in a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackNote {
    pub start: f64,
    pub pitch: u8,
    pub velocity: u8,
}

/// One instrument track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// General MIDI program the channel should be set to
    #[serde(default)]
    pub program: u8,
    pub notes: Vec<TrackNote>,
}

#[derive(Debug, Deserialize)]
struct ScoreFile {
    tracks: Vec<Track>,
}

/// The flattened score plus the per-channel program table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// `programs[channel]` is the instrument for that channel
    pub programs: Vec<u8>,
    notes: Vec<NoteEvent>,
}

impl Score {
    /// Flatten tracks into one sequence sorted by (onset, pitch).
    ///
    /// Channels are assigned by track order. Rejects negative or non-finite
    /// onsets and more tracks than there are channel numbers.
    pub fn from_tracks(tracks: &[Track]) -> Result<Self> {
        if tracks.len() > usize::from(u8::MAX) + 1 {
            let reason = format!("{} tracks exceed the channel range", tracks.len());
            return Err(ArenaError::invalid("tracks", reason));
        }

        let mut notes = Vec::with_capacity(tracks.iter().map(|t| t.notes.len()).sum());
        for (track_index, track) in tracks.iter().enumerate() {
            for (index, note) in track.notes.iter().enumerate() {
                if !note.start.is_finite() || note.start < 0.0 {
                    return Err(ArenaError::InvalidNote {
                        track: track_index,
                        index,
                        start: note.start,
                    });
                }
                notes.push(NoteEvent {
                    time: round_to_millis(note.start),
                    pitch: note.pitch,
                    velocity: note.velocity,
                    channel: track_index as u8,
                });
            }
        }

        notes.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.pitch.cmp(&b.pitch)));

        log::info!("Score: {} notes across {} tracks", notes.len(), tracks.len());
        Ok(Self {
            programs: tracks.iter().map(|t| t.program).collect(),
            notes,
        })
    }

    /// Parse the JSON track format
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ScoreFile = serde_json::from_str(json)?;
        Self::from_tracks(&file.tracks)
    }

    /// Load a JSON score from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Onset of the last note, or 0 for an empty score
    pub fn duration(&self) -> f64 {
        self.notes.last().map_or(0.0, |n| n.time)
    }

    pub fn into_events(self) -> Vec<NoteEvent> {
        self.notes
    }
}

fn round_to_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
