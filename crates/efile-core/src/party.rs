//! # Parties
//!
//! Party kinds and the small validated text types used when recording
//! plaintiffs and defendants. The plaintiff of a case is always a registered
//! individual or organization referenced by id; the defendant is recorded
//! inline with a name, contact details, and a [`DefendantType`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Which registry a plaintiff reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyKind {
    /// A natural person.
    Individual,
    /// A company, agency, or other body.
    Organization,
}

impl PartyKind {
    /// The canonical string name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Organization => "organization",
        }
    }
}

impl std::fmt::Display for PartyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartyKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "individual" => Ok(Self::Individual),
            "organization" | "organisation" => Ok(Self::Organization),
            other => Err(ValidationError::UnknownPartyKind(other.to_string())),
        }
    }
}

/// Type of an inline defendant record. Same vocabulary as [`PartyKind`],
/// kept separate because a defendant is never a registry reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefendantType {
    /// A natural person.
    Individual,
    /// A company, agency, or other body.
    Organization,
}

impl From<PartyKind> for DefendantType {
    fn from(kind: PartyKind) -> Self {
        match kind {
            PartyKind::Individual => Self::Individual,
            PartyKind::Organization => Self::Organization,
        }
    }
}

/// A loosely validated e-mail address (`local@domain`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContactEmail(String);

impl ContactEmail {
    /// Validate and wrap an e-mail address. Surrounding whitespace is trimmed.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let trimmed = s.trim();
        match trimmed.split_once('@') {
            Some((local, domain))
                if !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !domain.contains('@')
                    && !trimmed.contains(char::is_whitespace) =>
            {
                Ok(Self(trimmed.to_string()))
            }
            _ => Err(ValidationError::InvalidEmail(s)),
        }
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContactEmail {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ContactEmail> for String {
    fn from(email: ContactEmail) -> Self {
        email.0
    }
}

impl std::fmt::Display for ContactEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim `value` and reject it if nothing is left.
pub fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyField { field })
    } else {
        Ok(trimmed.to_string())
    }
}
