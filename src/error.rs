//! # Engine Errors
//!
//! Every failure the tide engine and the vendor boundary can report. Network
//! failures live with the client in [`crate::client::FetchError`].

use thiserror::Error;

/// Errors raised while turning vendor tide entries into a usable tide sequence.
///
/// None of these abort a batch: callers drop the affected station's tide data
/// and carry on with the rest.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TideError {
    /// Zone identifier is not in the IANA database
    #[error("invalid time zone: {0}")]
    InvalidTimeZone(String),

    /// Local timestamp does not match `YYYY-MM-DD HH:MM:SS`
    #[error("malformed timestamp: {0:?}")]
    MalformedTimestamp(String),

    /// Wall-clock reading occurs twice (fall-back overlap) and the policy refuses to pick
    #[error("ambiguous local time {local} in {zone}")]
    AmbiguousLocalTime { local: String, zone: String },

    /// Wall-clock reading is skipped (spring-forward gap) and the policy refuses to shift
    #[error("nonexistent local time {local} in {zone}")]
    NonexistentLocalTime { local: String, zone: String },

    /// Events out of order or not alternating between high and low
    #[error("malformed tide sequence at event {index}: {reason}")]
    MalformedTideSequence { index: usize, reason: &'static str },

    /// Vendor document lacks a field the engine needs
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Tide entry `type` other than "high" or "low"
    #[error("unknown tide type: {0:?}")]
    UnknownTideKind(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = TideError::InvalidTimeZone("Mars/Olympus".to_string());
        assert_eq!(err.to_string(), "invalid time zone: Mars/Olympus");

        let err = TideError::MalformedTideSequence {
            index: 3,
            reason: "consecutive events share a kind",
        };
        assert!(err.to_string().contains("event 3"));
    }
}
