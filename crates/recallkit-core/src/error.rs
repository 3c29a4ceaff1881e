//! Scoring error types.
//!
//! Every failure the scoring engine can report is a contract violation by the
//! caller. They all share the single [`ErrorKind::InvalidInput`] kind; the
//! variants only carry enough detail to say which contract was broken.

use thiserror::Error;

/// Convenience alias for results produced by the scoring engine.
pub type ScoringResult<T> = Result<T, ScoringError>;

/// Broad classification of a [`ScoringError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller handed the engine input it cannot score.
    InvalidInput,
}

/// Errors raised by the pure scoring and aggregation functions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// The original stimulus sequence was empty.
    #[error("invalid input: original sequence is empty")]
    EmptyStimulus,

    /// The recalled sequence is longer than the original and cannot be padded.
    #[error("invalid input: recalled sequence has {recalled} entries but original has {original}")]
    LengthMismatch { original: usize, recalled: usize },

    /// The stimulus does not have the length the scorer was configured for.
    #[error("invalid input: expected a sequence of {expected} symbols, got {actual}")]
    UnexpectedLength { expected: usize, actual: usize },

    /// Primacy and recency zones would overlap.
    #[error("invalid input: zone size {zone_size} does not fit a list of {len} items (needs at least {})", .zone_size * 2)]
    ZoneOverflow { len: usize, zone_size: usize },

    /// A requested condition group has no trials.
    #[error("invalid input: no trials in group '{0}'")]
    EmptyGroup(String),

    /// Aggregation was asked to summarise an empty set of trials.
    #[error("invalid input: no trials to aggregate")]
    NoTrials,

    /// The chunk had no symbols.
    #[error("invalid input: chunk is empty")]
    EmptyChunk,

    /// The chunk runs past the end of the original sequence.
    #[error("invalid input: chunk of {chunk_len} symbols at index {start} exceeds sequence length {len}")]
    ChunkOutOfRange {
        start: usize,
        chunk_len: usize,
        len: usize,
    },

    /// The chunk symbols are not embedded in the original at the given offset.
    #[error("invalid input: chunk does not match original at index {index}")]
    ChunkMismatch { index: usize },
}

impl ScoringError {
    /// Returns the error kind. Every scoring error is an invalid-input error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }

    /// Returns `true` if this error was caused by caller input.
    pub fn is_invalid_input(&self) -> bool {
        self.kind() == ErrorKind::InvalidInput
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_is_invalid_input() {
        let errors = [
            ScoringError::EmptyStimulus,
            ScoringError::LengthMismatch {
                original: 5,
                recalled: 6,
            },
            ScoringError::UnexpectedLength {
                expected: 7,
                actual: 6,
            },
            ScoringError::ZoneOverflow {
                len: 6,
                zone_size: 5,
            },
            ScoringError::EmptyGroup("control".into()),
            ScoringError::NoTrials,
            ScoringError::EmptyChunk,
            ScoringError::ChunkOutOfRange {
                start: 5,
                chunk_len: 4,
                len: 7,
            },
            ScoringError::ChunkMismatch { index: 2 },
        ];
        for e in &errors {
            assert_eq!(e.kind(), ErrorKind::InvalidInput);
            assert!(e.to_string().starts_with("invalid input"));
        }
    }

    #[test]
    fn zone_overflow_message_names_minimum_length() {
        let e = ScoringError::ZoneOverflow {
            len: 8,
            zone_size: 5,
        };
        assert!(e.to_string().contains("needs at least 10"));
    }
}
