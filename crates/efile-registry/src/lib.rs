#![deny(missing_docs)]

//! # efile-registry: Case Numbering and Lifecycle
//!
//! The logical heart of the e-filing backend:
//!
//! - [`allocator`]: per-year case numbers from an atomic [`CounterStore`].
//! - [`controller`]: [`CaseRegistry`], which files cases and enforces the
//!   `Filed → Served → HearingScheduled → Adjudicated` order.
//! - [`repository`]: the [`CaseRepository`] seam with optimistic,
//!   version-checked writes.
//! - [`resolver`] and [`directory`]: reference data a filing points at,
//!   checked before a number is spent.
//!
//! Storage is always reached through a trait object handed in at
//! construction. In-memory implementations live here; Postgres ones live
//! in `efile-api`.

pub mod allocator;
pub mod case;
pub mod clock;
pub mod controller;
pub mod directory;
pub mod error;
pub mod repository;
pub mod resolver;

pub use allocator::{CaseNumberAllocator, CounterStore, InMemoryCounterStore};
pub use case::{
    Case, CaseStage, Defendant, FilingMetadata, Hearing, PlaintiffRef, ServiceRecord, StagePatch,
    StageTransition, Verdict,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use controller::{
    CaseRegistry, DefendantDetails, FilingRequest, HearingRequest, ServiceRequest, VerdictRequest,
};
pub use directory::{
    Directory, DirectoryEntry, DirectoryStore, InMemoryDirectoryStore, NewAdvocate, NewCourtStaff,
    NewPayment, StaffRole,
};
pub use error::{RegistryError, StoreError};
pub use repository::{CaseRepository, InMemoryCaseRepository};
pub use resolver::{PartyRef, PartyResolver, ReferenceKind, ResolvedParty};
