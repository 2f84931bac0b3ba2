#![deny(missing_docs)]

//! # efile-core: Foundational Types for the Case Registry
//!
//! Domain primitives shared by every other crate in the workspace. This crate
//! performs no I/O and depends only on `serde`, `thiserror`, and `uuid`.
//!
//! ## Design Principles
//!
//! 1. **One newtype per reference kind.** A [`CourtStationId`] cannot be
//!    passed where a [`CaseTypeId`] is expected, even though both wrap a UUID.
//!
//! 2. **Case numbers are structured.** [`CaseNumber`] stores the full
//!    [`FilingYear`] and the per-year sequence. The `"7/24"` text form is a
//!    rendering, never the source of truth.
//!
//! 3. **Validation at construction.** Years, sequences, and required text
//!    fields are checked when the value is built and report a
//!    [`ValidationError`] carrying the rejected input.

pub mod case_number;
pub mod error;
pub mod identity;
pub mod party;

pub use case_number::{CaseNumber, FilingYear};
pub use error::ValidationError;
pub use identity::{
    AdvocateId, CaseCategoryId, CaseId, CaseTypeId, CourtStationId, FormId, IndividualId,
    OrganizationId, PaymentId,
};
pub use party::{require_text, ContactEmail, DefendantType, PartyKind};
