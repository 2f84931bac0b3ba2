//! # Validation Errors
//!
//! Construction-time failures for the domain primitives in this crate.
//! Every variant carries the rejected input so callers can report it back
//! without re-deriving it.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Filing year is outside the four-digit range.
    #[error("invalid filing year: {0} (expected a four-digit year)")]
    InvalidYear(i64),

    /// Case sequence numbers start at 1.
    #[error("invalid case sequence: {0} (sequences start at 1)")]
    InvalidSequence(u64),

    /// Case number text does not match `<sequence>/<yy>`.
    #[error("invalid case number: \"{0}\" (expected <sequence>/<yy>, e.g. 7/24)")]
    InvalidCaseNumber(String),

    /// A required text field was empty or whitespace.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// E-mail address lacks a local part, an `@`, or a domain.
    #[error("invalid e-mail address: \"{0}\"")]
    InvalidEmail(String),

    /// Party kind string is not one of the supported kinds.
    #[error("unknown party kind: \"{0}\" (expected individual or organization)")]
    UnknownPartyKind(String),
}
