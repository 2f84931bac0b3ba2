//! # Case Numbers
//!
//! A case number pairs a four-digit [`FilingYear`] with a per-year sequence
//! that starts at 1 every calendar year. It renders as `"<sequence>/<yy>"`,
//! e.g. `7/24` for the seventh case filed in 2024.
//!
//! Only the full year is stored. The two-digit fragment drops the century,
//! so parsing the text form needs a century base
//! ([`CaseNumber::parse_in_century`]); the [`FromStr`] impl assumes the
//! 2000s.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Century assumed when parsing a two-digit year fragment without context.
pub const DEFAULT_CENTURY: u16 = 2000;

/// A validated four-digit calendar year used to scope case numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct FilingYear(u16);

impl FilingYear {
    /// Create a filing year, rejecting anything outside `1000..=9999`.
    pub fn new(year: i64) -> Result<Self, ValidationError> {
        if (1000..=9999).contains(&year) {
            Ok(Self(year as u16))
        } else {
            Err(ValidationError::InvalidYear(year))
        }
    }

    /// The full year, e.g. `2024`.
    pub fn value(&self) -> u16 {
        self.0
    }

    /// The last two digits of the year, e.g. `24` for 2024 and `7` for 2007.
    pub fn suffix(&self) -> u16 {
        self.0 % 100
    }
}

impl TryFrom<i64> for FilingYear {
    type Error = ValidationError;

    fn try_from(year: i64) -> Result<Self, Self::Error> {
        Self::new(year)
    }
}

impl From<FilingYear> for i64 {
    fn from(year: FilingYear) -> Self {
        i64::from(year.0)
    }
}

impl std::fmt::Display for FilingYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique, per-year case number.
///
/// Ordering is by year, then sequence, which matches filing order within
/// the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCaseNumber")]
pub struct CaseNumber {
    /// Year the case was filed in.
    pub year: FilingYear,
    /// Position within the year, starting at 1.
    pub sequence: u32,
}

/// Unvalidated wire form of [`CaseNumber`].
#[derive(Deserialize)]
struct RawCaseNumber {
    year: FilingYear,
    sequence: u32,
}

impl TryFrom<RawCaseNumber> for CaseNumber {
    type Error = ValidationError;

    fn try_from(raw: RawCaseNumber) -> Result<Self, Self::Error> {
        Self::new(raw.year, raw.sequence)
    }
}

impl CaseNumber {
    /// Build a case number, rejecting a zero sequence.
    pub fn new(year: FilingYear, sequence: u32) -> Result<Self, ValidationError> {
        if sequence == 0 {
            return Err(ValidationError::InvalidSequence(0));
        }
        Ok(Self { year, sequence })
    }

    /// Parse `"<sequence>/<yy>"`, expanding `yy` within `century`
    /// (e.g. `1900` or `2000`).
    pub fn parse_in_century(s: &str, century: u16) -> Result<Self, ValidationError> {
        let malformed = || ValidationError::InvalidCaseNumber(s.to_string());
        let (seq, yy) = s.trim().split_once('/').ok_or_else(malformed)?;
        if seq.is_empty() || yy.is_empty() || yy.len() > 2 {
            return Err(malformed());
        }
        if !seq.bytes().all(|b| b.is_ascii_digit()) || !yy.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let sequence: u32 = seq.parse().map_err(|_| malformed())?;
        let fragment: u16 = yy.parse().map_err(|_| malformed())?;
        let base = i64::from(century) - i64::from(century % 100);
        let year = FilingYear::new(base + i64::from(fragment))?;
        Self::new(year, sequence)
    }

    /// Build a case number from the sequence and two-digit fragment as they
    /// appear in a URL path, assuming the 2000s.
    pub fn from_parts(sequence: u32, yy: u16) -> Result<Self, ValidationError> {
        if yy > 99 {
            return Err(ValidationError::InvalidCaseNumber(format!("{sequence}/{yy}")));
        }
        let year = FilingYear::new(i64::from(DEFAULT_CENTURY + yy))?;
        Self::new(year, sequence)
    }
}

impl std::fmt::Display for CaseNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{:02}", self.sequence, self.year.suffix())
    }
}

impl FromStr for CaseNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_in_century(s, DEFAULT_CENTURY)
    }
}
