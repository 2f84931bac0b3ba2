//! # Party Resolver
//!
//! Filing references court stations, catalogue entries, the filing
//! advocate, the plaintiff and optionally a form and a payment. All of
//! them live outside the case registry. The controller checks each one
//! through a [`PartyResolver`] before a case number is spent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use efile_core::{
    AdvocateId, CaseCategoryId, CaseTypeId, CourtStationId, FormId, IndividualId,
    OrganizationId, PaymentId,
};

use crate::case::PlaintiffRef;
use crate::error::RegistryError;

/// The kinds of record held in the directory. All but
/// [`ReferenceKind::CourtStaff`] can be the target of a filing reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// A physical court location.
    CourtStation,
    /// Case type catalogue entry.
    CaseType,
    /// Case category catalogue entry.
    CaseCategory,
    /// A registered advocate.
    Advocate,
    /// A registered individual party.
    Individual,
    /// A registered organization party.
    Organization,
    /// A filing form.
    Form,
    /// A fee payment.
    Payment,
    /// A member of a court station's staff roster.
    CourtStaff,
}

impl ReferenceKind {
    /// Every kind, in declaration order.
    pub const ALL: [ReferenceKind; 9] = [
        Self::CourtStation,
        Self::CaseType,
        Self::CaseCategory,
        Self::Advocate,
        Self::Individual,
        Self::Organization,
        Self::Form,
        Self::Payment,
        Self::CourtStaff,
    ];

    /// Canonical snake_case name, also used as the storage tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CourtStation => "court_station",
            Self::CaseType => "case_type",
            Self::CaseCategory => "case_category",
            Self::Advocate => "advocate",
            Self::Individual => "individual",
            Self::Organization => "organization",
            Self::Form => "form",
            Self::Payment => "payment",
            Self::CourtStaff => "court_staff",
        }
    }

    /// Parse a storage tag produced by [`ReferenceKind::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Catalogue kinds carry names that must be unique, ignoring case.
    pub fn is_catalogue(&self) -> bool {
        matches!(self, Self::CourtStation | Self::CaseType | Self::CaseCategory)
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed reference to an externally owned record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PartyRef {
    /// A court station.
    CourtStation(CourtStationId),
    /// A case type.
    CaseType(CaseTypeId),
    /// A case category.
    CaseCategory(CaseCategoryId),
    /// An advocate.
    Advocate(AdvocateId),
    /// An individual.
    Individual(IndividualId),
    /// An organization.
    Organization(OrganizationId),
    /// A filing form.
    Form(FormId),
    /// A fee payment.
    Payment(PaymentId),
}

impl PartyRef {
    /// Which registry the reference points into.
    pub fn kind(&self) -> ReferenceKind {
        match self {
            Self::CourtStation(_) => ReferenceKind::CourtStation,
            Self::CaseType(_) => ReferenceKind::CaseType,
            Self::CaseCategory(_) => ReferenceKind::CaseCategory,
            Self::Advocate(_) => ReferenceKind::Advocate,
            Self::Individual(_) => ReferenceKind::Individual,
            Self::Organization(_) => ReferenceKind::Organization,
            Self::Form(_) => ReferenceKind::Form,
            Self::Payment(_) => ReferenceKind::Payment,
        }
    }

    /// The raw identifier.
    pub fn id(&self) -> Uuid {
        match self {
            Self::CourtStation(id) => *id.as_uuid(),
            Self::CaseType(id) => *id.as_uuid(),
            Self::CaseCategory(id) => *id.as_uuid(),
            Self::Advocate(id) => *id.as_uuid(),
            Self::Individual(id) => *id.as_uuid(),
            Self::Organization(id) => *id.as_uuid(),
            Self::Form(id) => *id.as_uuid(),
            Self::Payment(id) => *id.as_uuid(),
        }
    }
}

impl From<PlaintiffRef> for PartyRef {
    fn from(plaintiff: PlaintiffRef) -> Self {
        match plaintiff {
            PlaintiffRef::Individual(id) => Self::Individual(id),
            PlaintiffRef::Organization(id) => Self::Organization(id),
        }
    }
}

impl std::fmt::Display for PartyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// What a successful resolution returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedParty {
    /// The reference that was resolved.
    pub reference: PartyRef,
    /// Display name of the record.
    pub name: String,
}

/// Looks up externally owned records by reference.
#[async_trait]
pub trait PartyResolver: Send + Sync {
    /// Resolve one reference.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if nothing matches, or a store error.
    async fn resolve(&self, reference: &PartyRef) -> Result<ResolvedParty, RegistryError>;
}
