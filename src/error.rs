//! Error types for chord-arena.
//!
//! Only construction and loading can fail. A running simulation never errors:
//! degenerate geometry degrades to "no collision" and an exhausted score to
//! silence.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("unknown variant `{0}` (expected freeze, pulse, rotation or ring-race)")]
    UnknownVariant(String),

    #[error("score track {track} note {index} has invalid start time {start}")]
    InvalidNote { track: usize, index: usize, start: f64 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArenaError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ArenaError>;
