//! Error types for matching, arbitration, and configuration.

use thiserror::Error;

/// Caller contract violations. These are the only failures that cross the
/// engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("reference track has no title")]
    MissingTitle,

    #[error("reference track has no primary artist")]
    MissingArtist,
}

/// Reasons an arbitration attempt produced no usable verdict.
///
/// Always recovered locally by falling back to the top-ranked candidate;
/// kept around only so the fallback can be logged and reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArbitrationError {
    #[error("no arbitrator configured")]
    Unavailable,

    #[error("arbitrator request timed out")]
    Timeout,

    #[error("arbitrator transport failed: {0}")]
    Transport(String),

    #[error("arbitrator returned an empty response")]
    EmptyResponse,

    #[error("malformed verdict: {reason}")]
    Malformed { reason: String },

    #[error("verdict index {index} out of range for {sent} candidates")]
    IndexOutOfRange { index: i64, sent: usize },

    #[error("verdict confidence {0} outside 0-100")]
    InvalidConfidence(f64),
}

/// Errors that can occur while loading or validating [`crate::config::MatchConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable held something that does not parse as a number.
    #[error("failed to parse {name}='{value}': {reason}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Value parsed but violates a basic invariant.
    #[error("invalid {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}
