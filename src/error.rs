//! Error types for tidemark operations.

use crate::types::TimeKey;
use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TidemarkError>;

/// Errors produced by the index, the query engine, and the store.
///
/// Absence is never an error: `by_id`, `exact`, `as_of`, and every scoped
/// sequence query report missing data through `None` or an empty `Vec`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TidemarkError {
    /// An insert collided with an existing record at the same owner and
    /// time key. The partition is left unchanged.
    #[error("duplicate time key {time} in partition")]
    DuplicateTimeKey { time: TimeKey },

    /// A range query was given a lower bound after its upper bound.
    #[error("invalid range: from {from} is after until {until}")]
    InvalidRange { from: TimeKey, until: TimeKey },

    /// A system time could not be represented as a `TimeKey`.
    #[error("timestamp outside the representable time key range")]
    InvalidTimestamp,

    /// Payload encoding or decoding failed.
    #[error("serialization error: {0}")]
    SerializationErrorWithContext(String),

    /// Generic error with a descriptive message.
    #[error("{0}")]
    Other(String),
}
