//! # Case Lifecycle Controller
//!
//! [`CaseRegistry`] files cases and moves them through
//! `Filed → Served → HearingScheduled → Adjudicated`.
//!
//! ## Filing
//!
//! 1. Required text fields are checked.
//! 2. Every reference is resolved through the [`PartyResolver`].
//! 3. Only then is a number allocated for the UTC year of the filing.
//! 4. The case is created in the repository.
//!
//! Steps 1 and 2 fail with [`RegistryError::InvalidInput`] and consume no
//! number. A failure in step 4 leaves a gap in the year's sequence; the gap
//! is logged and the number is never reissued.
//!
//! ## Transitions
//!
//! Each transition reads the case, plans the patch against the stage that
//! was read, and writes through
//! [`CaseRepository::conditional_update`] with the version that was read.
//! A concurrent writer that got there first turns the write into
//! [`RegistryError::ConcurrentModification`]. The controller keeps no
//! per-case state between calls.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use efile_core::{
    require_text, AdvocateId, CaseCategoryId, CaseId, CaseNumber, CaseTypeId, ContactEmail,
    CourtStationId, DefendantType, FilingYear, FormId, PaymentId,
};

use crate::allocator::{CaseNumberAllocator, CounterStore};
use crate::case::{Case, Defendant, FilingMetadata, PlaintiffRef, StagePatch};
use crate::clock::Clock;
use crate::error::RegistryError;
use crate::repository::CaseRepository;
use crate::resolver::{PartyRef, PartyResolver};

/// Defendant details as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefendantDetails {
    /// Name of the defendant.
    pub name: String,
    /// Person or body.
    pub defendant_type: DefendantType,
    /// Contact e-mail, validated on filing.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone number.
    #[serde(default)]
    pub cellphone: Option<String>,
}

impl DefendantDetails {
    fn validate(self) -> Result<Defendant, RegistryError> {
        let email = match self.email.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(ContactEmail::new(raw)?),
        };
        let cellphone = self
            .cellphone
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(Defendant {
            name: require_text("defendant.name", &self.name)?,
            defendant_type: self.defendant_type,
            email,
            cellphone,
        })
    }
}

/// Everything needed to file a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRequest {
    /// Short title of the matter.
    pub title: String,
    /// Description of the claim.
    pub description: String,
    /// Court station to file at.
    pub court_station: CourtStationId,
    /// Case type.
    pub case_type: CaseTypeId,
    /// Case category.
    pub case_category: CaseCategoryId,
    /// Filing advocate.
    pub advocate: AdvocateId,
    /// Party bringing the case.
    pub plaintiff: PlaintiffRef,
    /// Party the case is brought against.
    pub defendant: DefendantDetails,
    /// Filing form, if any.
    #[serde(default)]
    pub form: Option<FormId>,
    /// Filing-fee payment, if any.
    #[serde(default)]
    pub payment: Option<PaymentId>,
}

impl FilingRequest {
    fn references(&self) -> Vec<PartyRef> {
        let mut refs = vec![
            PartyRef::CourtStation(self.court_station),
            PartyRef::CaseType(self.case_type),
            PartyRef::CaseCategory(self.case_category),
            PartyRef::Advocate(self.advocate),
            PartyRef::from(self.plaintiff),
        ];
        refs.extend(self.form.map(PartyRef::Form));
        refs.extend(self.payment.map(PartyRef::Payment));
        refs
    }
}

/// `Filed → Served`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRequest {
    /// The message served on the defendant.
    pub message: String,
    /// Version the caller last saw, if it wants the write fenced on it.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// `Served → HearingScheduled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HearingRequest {
    /// When the hearing takes place.
    pub date: DateTime<Utc>,
    /// Presiding judge.
    pub judge: String,
    /// Optional notes for the parties.
    #[serde(default)]
    pub notes: Option<String>,
    /// Version the caller last saw.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// `HearingScheduled → Adjudicated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictRequest {
    /// Ruling text.
    pub ruling: String,
    /// Date the ruling was delivered.
    pub date: DateTime<Utc>,
    /// Version the caller last saw.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Files cases and drives their lifecycle.
#[derive(Clone)]
pub struct CaseRegistry {
    repository: Arc<dyn CaseRepository>,
    allocator: CaseNumberAllocator,
    resolver: Arc<dyn PartyResolver>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CaseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseRegistry")
            .field("allocator", &self.allocator)
            .finish_non_exhaustive()
    }
}

impl CaseRegistry {
    /// Assemble a registry from its collaborators.
    pub fn new(
        repository: Arc<dyn CaseRepository>,
        counters: Arc<dyn CounterStore>,
        resolver: Arc<dyn PartyResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            allocator: CaseNumberAllocator::new(counters),
            resolver,
            clock,
        }
    }

    /// File a new case in the `Filed` stage.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidInput`] for empty text, a malformed
    ///   e-mail, or any reference that does not resolve. No number is
    ///   consumed.
    /// - [`RegistryError::AllocationFailed`] if no number could be issued.
    /// - [`RegistryError::Store`] if the case could not be persisted.
    pub async fn file_case(&self, request: FilingRequest) -> Result<Case, RegistryError> {
        let title = require_text("title", &request.title)?;
        let description = require_text("description", &request.description)?;
        let references = request.references();
        let defendant = request.defendant.validate()?;

        for reference in &references {
            self.require_resolved(reference).await?;
        }

        let filed_at = self.clock.now();
        let year = FilingYear::new(i64::from(filed_at.year()))?;
        let case_number = self.allocator.allocate(year).await?;

        let case = Case::file(
            CaseId::new(),
            case_number,
            request.plaintiff,
            defendant,
            FilingMetadata {
                title,
                description,
                court_station: request.court_station,
                case_type: request.case_type,
                case_category: request.case_category,
                advocate: request.advocate,
                form: request.form,
                payment: request.payment,
                filed_at,
            },
        );
        let case_id = case.id;

        match self.repository.create(case).await {
            Ok(case) => {
                tracing::info!(
                    case_id = %case.id,
                    case_number = %case.case_number,
                    year = year.value(),
                    advocate = %case.filing.advocate,
                    "case filed"
                );
                Ok(case)
            }
            Err(e) => {
                let last_issued = self.allocator.last_issued(year).await.ok();
                tracing::warn!(
                    case_id = %case_id,
                    case_number = %case_number,
                    year = year.value(),
                    last_issued = ?last_issued,
                    error = %e,
                    "case create failed; case number left as a gap"
                );
                Err(e)
            }
        }
    }

    /// Record service on the defendant.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`], [`RegistryError::InvalidTransition`]
    /// unless the case is `Filed`, or [`RegistryError::ConcurrentModification`].
    pub async fn record_service(
        &self,
        id: &CaseId,
        request: ServiceRequest,
    ) -> Result<Case, RegistryError> {
        let message = require_text("message", &request.message)?;
        self.transition(id, request.expected_version, move |case, at| {
            case.plan_service(message, at)
        })
        .await
    }

    /// Assign a hearing date and judge.
    ///
    /// # Errors
    ///
    /// As [`CaseRegistry::record_service`]; the case must be `Served`.
    pub async fn schedule_hearing(
        &self,
        id: &CaseId,
        request: HearingRequest,
    ) -> Result<Case, RegistryError> {
        let judge = require_text("judge", &request.judge)?;
        let notes = request
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let date = request.date;
        self.transition(id, request.expected_version, move |case, at| {
            case.plan_hearing(date, judge, notes, at)
        })
        .await
    }

    /// Record the verdict.
    ///
    /// # Errors
    ///
    /// As [`CaseRegistry::record_service`]; the case must be
    /// `HearingScheduled`.
    pub async fn record_verdict(
        &self,
        id: &CaseId,
        request: VerdictRequest,
    ) -> Result<Case, RegistryError> {
        let ruling = require_text("ruling", &request.ruling)?;
        let date = request.date;
        self.transition(id, request.expected_version, move |case, at| {
            case.plan_verdict(ruling, date, at)
        })
        .await
    }

    /// Fetch one case.
    pub async fn get_case(&self, id: &CaseId) -> Result<Case, RegistryError> {
        self.repository.get(id).await
    }

    /// Cases filed by an advocate, newest first.
    pub async fn cases_for_advocate(&self, advocate: &AdvocateId) -> Result<Vec<Case>, RegistryError> {
        self.repository.list_by_advocate(advocate).await
    }

    /// Cases filed at a court station, newest first.
    pub async fn cases_for_court_station(
        &self,
        station: &CourtStationId,
    ) -> Result<Vec<Case>, RegistryError> {
        self.repository.list_by_court_station(station).await
    }

    /// Look a case up by its number.
    pub async fn find_by_number(&self, number: &CaseNumber) -> Result<Case, RegistryError> {
        self.repository
            .find_by_number(number)
            .await?
            .ok_or_else(|| RegistryError::NotFound {
                kind: "case",
                id: number.to_string(),
            })
    }

    async fn require_resolved(&self, reference: &PartyRef) -> Result<(), RegistryError> {
        match self.resolver.resolve(reference).await {
            Ok(_) => Ok(()),
            Err(RegistryError::NotFound { .. }) => {
                tracing::warn!(reference = %reference, "filing rejected: unresolved reference");
                Err(RegistryError::InvalidInput(format!(
                    "{reference} does not exist"
                )))
            }
            Err(e) => Err(e),
        }
    }

    async fn transition<F>(
        &self,
        id: &CaseId,
        expected_version: Option<u64>,
        plan: F,
    ) -> Result<Case, RegistryError>
    where
        F: FnOnce(&Case, DateTime<Utc>) -> Result<StagePatch, RegistryError> + Send,
    {
        let current = self.repository.get(id).await?;

        if let Some(expected) = expected_version {
            if expected != current.version {
                tracing::warn!(
                    case_id = %id,
                    expected,
                    actual = current.version,
                    "transition rejected: stale version"
                );
                return Err(RegistryError::ConcurrentModification {
                    case_id: *id,
                    expected,
                    actual: current.version,
                });
            }
        }

        let patch = plan(&current, self.clock.now()).map_err(|e| {
            tracing::warn!(case_id = %id, stage = %current.stage, error = %e, "transition rejected");
            e
        })?;
        let target = patch.target_stage();

        match self
            .repository
            .conditional_update(id, current.version, patch)
            .await
        {
            Ok(case) => {
                tracing::info!(
                    case_id = %case.id,
                    case_number = %case.case_number,
                    stage = %case.stage,
                    version = case.version,
                    "case advanced"
                );
                Ok(case)
            }
            Err(e) => {
                tracing::warn!(
                    case_id = %id,
                    stage = %target,
                    error = %e,
                    "stage write failed"
                );
                Err(e)
            }
        }
    }
}
