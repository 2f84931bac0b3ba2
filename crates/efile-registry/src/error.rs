//! # Registry Error Types
//!
//! Every registry operation returns a typed [`RegistryError`]. Errors are
//! scoped to the single request that produced them; none is fatal to the
//! process and none is swallowed.
//!
//! State machine rejections carry the case id, the current stage, and the
//! attempted stage. Lost optimistic races carry both versions.

use efile_core::{CaseId, FilingYear, ValidationError};
use thiserror::Error;

use crate::case::CaseStage;

/// Errors arising from case registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Malformed or missing input, including references that do not resolve.
    /// The caller must change the request before retrying.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced case or directory entry does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// What was looked up ("case", "court_station", ...).
        kind: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// The case is not in the stage the transition requires.
    #[error("case {case_id}: invalid transition from {from} to {to}")]
    InvalidTransition {
        /// The case that rejected the transition.
        case_id: CaseId,
        /// Stage the case is currently in.
        from: CaseStage,
        /// Stage the caller tried to move to.
        to: CaseStage,
    },

    /// Another writer advanced the case between our read and our write.
    #[error("case {case_id} was modified concurrently (expected version {expected}, found {actual})")]
    ConcurrentModification {
        /// The contested case.
        case_id: CaseId,
        /// Version the caller read.
        expected: u64,
        /// Version actually stored.
        actual: u64,
    },

    /// The per-year counter could not be advanced. No number was issued.
    #[error("case number allocation failed for {year}: {reason}")]
    AllocationFailed {
        /// Year the number was requested for.
        year: FilingYear,
        /// Underlying failure.
        reason: String,
    },

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl RegistryError {
    /// Build a [`RegistryError::NotFound`] for a case.
    pub fn case_not_found(id: &CaseId) -> Self {
        Self::NotFound {
            kind: "case",
            id: id.to_string(),
        }
    }

    /// Whether repeating the whole operation with fresh state may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConcurrentModification { .. } | Self::AllocationFailed { .. } => true,
            Self::Store(e) => e.is_transient(),
            Self::InvalidInput(_) | Self::NotFound { .. } | Self::InvalidTransition { .. } => false,
        }
    }
}

impl From<ValidationError> for RegistryError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Failures reported by a storage backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached or timed out.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored data could not be decoded into a valid record.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether the failure may clear up on its own.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_display_names_both_stages() {
        let err = RegistryError::InvalidTransition {
            case_id: CaseId::new(),
            from: CaseStage::Filed,
            to: CaseStage::Adjudicated,
        };
        let msg = err.to_string();
        assert!(msg.contains("FILED"));
        assert!(msg.contains("ADJUDICATED"));
    }

    #[test]
    fn concurrent_modification_display_names_versions() {
        let err = RegistryError::ConcurrentModification {
            case_id: CaseId::new(),
            expected: 3,
            actual: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected version 3"));
        assert!(msg.contains("found 4"));
    }

    #[test]
    fn retryability_matches_error_taxonomy() {
        let year = FilingYear::new(2024).unwrap();
        assert!(RegistryError::ConcurrentModification {
            case_id: CaseId::new(),
            expected: 1,
            actual: 2
        }
        .is_retryable());
        assert!(RegistryError::AllocationFailed {
            year,
            reason: "down".into()
        }
        .is_retryable());
        assert!(RegistryError::Store(StoreError::Unavailable("timeout".into())).is_retryable());
        assert!(!RegistryError::Store(StoreError::Conflict("dup".into())).is_retryable());
        assert!(!RegistryError::InvalidInput("x".into()).is_retryable());
        assert!(!RegistryError::case_not_found(&CaseId::new()).is_retryable());
    }

    #[test]
    fn validation_error_becomes_invalid_input() {
        let err = RegistryError::from(ValidationError::EmptyField { field: "title" });
        assert_eq!(err, RegistryError::InvalidInput("title must not be empty".into()));
    }
}
