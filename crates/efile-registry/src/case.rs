//! # Case Lifecycle
//!
//! The filed legal matter and its stage machine:
//! `Filed → Served → HearingScheduled → Adjudicated`.
//!
//! ## Validated Enum over Typestate
//!
//! Cases are loaded from storage where the stage is only known at runtime,
//! so the stage is a plain enum checked on every transition rather than a
//! type parameter. Each transition has a dedicated `plan_*` method taking
//! the payload that transition needs, and [`Case::apply`] re-checks the
//! precondition, so a patch built for one stage can never be written onto
//! another.
//!
//! ## Write Model
//!
//! A transition is split in two:
//!
//! 1. `plan_*` validates against the stage that was read and returns a
//!    [`StagePatch`]. Nothing is mutated.
//! 2. The repository applies the patch with [`Case::apply`] only if the
//!    stored [`version`](Case::version) still equals the version that was
//!    read.
//!
//! Every successful write bumps the version by one and appends a
//! [`StageTransition`] to the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use efile_core::{
    AdvocateId, CaseCategoryId, CaseId, CaseNumber, CaseTypeId, ContactEmail, CourtStationId,
    DefendantType, FormId, IndividualId, OrganizationId, PartyKind, PaymentId,
};

use crate::error::RegistryError;

// ── Case Stage ─────────────────────────────────────────────────────────

/// The lifecycle stage of a case.
///
/// ## Transition Graph
///
/// ```text
/// Filed ──record_service()──▶ Served ──schedule_hearing()──▶ HearingScheduled
///                                                                  │
///                                                          record_verdict()
///                                                                  │
///                                                                  ▼
///                                                             Adjudicated
/// ```
///
/// Transitions are strictly forward, one step at a time. No stage may be
/// skipped or repeated and `Adjudicated` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStage {
    /// The case has been filed and numbered.
    Filed,
    /// The defendant has been formally notified.
    Served,
    /// A hearing date and judge have been assigned.
    HearingScheduled,
    /// A verdict has been recorded. Terminal.
    Adjudicated,
}

impl CaseStage {
    /// Every stage in lifecycle order.
    pub const ALL: [CaseStage; 4] = [
        Self::Filed,
        Self::Served,
        Self::HearingScheduled,
        Self::Adjudicated,
    ];

    /// The canonical string name of this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filed => "FILED",
            Self::Served => "SERVED",
            Self::HearingScheduled => "HEARING_SCHEDULED",
            Self::Adjudicated => "ADJUDICATED",
        }
    }

    /// Parse the canonical string name produced by [`CaseStage::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == s)
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Adjudicated)
    }

    /// The only stage reachable from this one, if any.
    pub fn next(&self) -> Option<CaseStage> {
        match self {
            Self::Filed => Some(Self::Served),
            Self::Served => Some(Self::HearingScheduled),
            Self::HearingScheduled => Some(Self::Adjudicated),
            Self::Adjudicated => None,
        }
    }

    /// Transition table: valid target stages from this stage.
    pub fn valid_transitions(&self) -> &'static [CaseStage] {
        match self {
            Self::Filed => &[Self::Served],
            Self::Served => &[Self::HearingScheduled],
            Self::HearingScheduled => &[Self::Adjudicated],
            Self::Adjudicated => &[],
        }
    }
}

impl std::fmt::Display for CaseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Parties ────────────────────────────────────────────────────────────

/// Reference to the registered party bringing the case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PlaintiffRef {
    /// A registered individual.
    Individual(IndividualId),
    /// A registered organization.
    Organization(OrganizationId),
}

impl PlaintiffRef {
    /// Which registry the reference points into.
    pub fn kind(&self) -> PartyKind {
        match self {
            Self::Individual(_) => PartyKind::Individual,
            Self::Organization(_) => PartyKind::Organization,
        }
    }

    /// Build a reference from a kind tag and a raw UUID.
    pub fn from_parts(kind: PartyKind, id: uuid::Uuid) -> Self {
        match kind {
            PartyKind::Individual => Self::Individual(IndividualId::from_uuid(id)),
            PartyKind::Organization => Self::Organization(OrganizationId::from_uuid(id)),
        }
    }

    /// The raw UUID of the referenced party.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        match self {
            Self::Individual(id) => id.as_uuid(),
            Self::Organization(id) => id.as_uuid(),
        }
    }
}

/// The defendant, recorded inline on the case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defendant {
    /// Name as given on the filing.
    pub name: String,
    /// Whether the defendant is a person or a body.
    pub defendant_type: DefendantType,
    /// Contact e-mail used when serving.
    pub email: Option<ContactEmail>,
    /// Contact phone number.
    pub cellphone: Option<String>,
}

// ── Case Payloads ──────────────────────────────────────────────────────

/// Everything captured at filing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingMetadata {
    /// Short title of the matter.
    pub title: String,
    /// Free-text description of the claim.
    pub description: String,
    /// Court station the case is filed at.
    pub court_station: CourtStationId,
    /// Case type from the reference catalogue.
    pub case_type: CaseTypeId,
    /// Case category from the reference catalogue.
    pub case_category: CaseCategoryId,
    /// Advocate who filed the case.
    pub advocate: AdvocateId,
    /// Filing form, if one was used.
    pub form: Option<FormId>,
    /// Filing-fee payment, if one was recorded.
    pub payment: Option<PaymentId>,
    /// When the case was filed (UTC).
    pub filed_at: DateTime<Utc>,
}

/// Proof that the defendant was served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// The message served on the defendant.
    pub message: String,
    /// When service was recorded.
    pub served_at: DateTime<Utc>,
}

/// Hearing assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hearing {
    /// When the hearing takes place.
    pub date: DateTime<Utc>,
    /// Presiding judge.
    pub judge: String,
    /// Optional notes for the parties.
    pub notes: Option<String>,
    /// When the hearing was scheduled.
    pub scheduled_at: DateTime<Utc>,
}

/// The court's ruling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Ruling text.
    pub ruling: String,
    /// Date the ruling was delivered.
    pub date: DateTime<Utc>,
    /// When the verdict was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// One entry in a case's transition log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    /// Stage before the write.
    pub from: CaseStage,
    /// Stage after the write.
    pub to: CaseStage,
    /// When the write happened.
    pub at: DateTime<Utc>,
}

// ── Stage Patch ────────────────────────────────────────────────────────

/// A single forward transition and its payload, as handed to
/// `CaseRepository::conditional_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum StagePatch {
    /// `Filed → Served`.
    Serve(ServiceRecord),
    /// `Served → HearingScheduled`.
    ScheduleHearing(Hearing),
    /// `HearingScheduled → Adjudicated`.
    RecordVerdict(Verdict),
}

impl StagePatch {
    /// Stage the case must be in for this patch to apply.
    pub fn required_stage(&self) -> CaseStage {
        match self {
            Self::Serve(_) => CaseStage::Filed,
            Self::ScheduleHearing(_) => CaseStage::Served,
            Self::RecordVerdict(_) => CaseStage::HearingScheduled,
        }
    }

    /// Stage the case is in after this patch applies.
    pub fn target_stage(&self) -> CaseStage {
        match self {
            Self::Serve(_) => CaseStage::Served,
            Self::ScheduleHearing(_) => CaseStage::HearingScheduled,
            Self::RecordVerdict(_) => CaseStage::Adjudicated,
        }
    }

    /// When the transition was made.
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Serve(s) => s.served_at,
            Self::ScheduleHearing(h) => h.scheduled_at,
            Self::RecordVerdict(v) => v.recorded_at,
        }
    }
}

// ── The Case ───────────────────────────────────────────────────────────

/// A filed legal matter.
///
/// Created once by [`Case::file`] and afterwards only extended, one stage
/// at a time. `id` and `case_number` never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    /// Opaque unique identifier.
    pub id: CaseId,
    /// Per-year case number, assigned at filing.
    pub case_number: CaseNumber,
    /// Current lifecycle stage.
    pub stage: CaseStage,
    /// Optimistic concurrency token. `1` at filing, `+1` per transition.
    pub version: u64,
    /// Party bringing the case.
    pub plaintiff: PlaintiffRef,
    /// Party the case is brought against.
    pub defendant: Defendant,
    /// Filing details.
    pub filing: FilingMetadata,
    /// Present once the stage is at least `Served`.
    pub service: Option<ServiceRecord>,
    /// Present once the stage is at least `HearingScheduled`.
    pub hearing: Option<Hearing>,
    /// Present once the stage is `Adjudicated`.
    pub verdict: Option<Verdict>,
    /// Registrar sign-off on the filing. Informational.
    pub registrar_approval: bool,
    /// Append-only record of every stage change.
    pub transition_log: Vec<StageTransition>,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

impl Case {
    /// Create a case in the `Filed` stage.
    pub fn file(
        id: CaseId,
        case_number: CaseNumber,
        plaintiff: PlaintiffRef,
        defendant: Defendant,
        filing: FilingMetadata,
    ) -> Self {
        let filed_at = filing.filed_at;
        Self {
            id,
            case_number,
            stage: CaseStage::Filed,
            version: 1,
            plaintiff,
            defendant,
            filing,
            service: None,
            hearing: None,
            verdict: None,
            registrar_approval: false,
            transition_log: Vec::new(),
            updated_at: filed_at,
        }
    }

    /// Plan `Filed → Served`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidTransition`] unless the case is `Filed`.
    pub fn plan_service(
        &self,
        message: String,
        at: DateTime<Utc>,
    ) -> Result<StagePatch, RegistryError> {
        self.require_stage(CaseStage::Filed, CaseStage::Served)?;
        Ok(StagePatch::Serve(ServiceRecord {
            message,
            served_at: at,
        }))
    }

    /// Plan `Served → HearingScheduled`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidTransition`] unless the case is `Served`.
    pub fn plan_hearing(
        &self,
        date: DateTime<Utc>,
        judge: String,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<StagePatch, RegistryError> {
        self.require_stage(CaseStage::Served, CaseStage::HearingScheduled)?;
        Ok(StagePatch::ScheduleHearing(Hearing {
            date,
            judge,
            notes,
            scheduled_at: at,
        }))
    }

    /// Plan `HearingScheduled → Adjudicated`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidTransition`] unless the case is
    /// `HearingScheduled`.
    pub fn plan_verdict(
        &self,
        ruling: String,
        date: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<StagePatch, RegistryError> {
        self.require_stage(CaseStage::HearingScheduled, CaseStage::Adjudicated)?;
        Ok(StagePatch::RecordVerdict(Verdict {
            ruling,
            date,
            recorded_at: at,
        }))
    }

    /// Write a planned transition onto this case.
    ///
    /// Re-checks the precondition, so on error the case is untouched.
    pub fn apply(&mut self, patch: StagePatch) -> Result<(), RegistryError> {
        let from = patch.required_stage();
        let to = patch.target_stage();
        self.require_stage(from, to)?;
        let at = patch.at();
        match patch {
            StagePatch::Serve(record) => self.service = Some(record),
            StagePatch::ScheduleHearing(hearing) => self.hearing = Some(hearing),
            StagePatch::RecordVerdict(verdict) => self.verdict = Some(verdict),
        }
        self.transition_log.push(StageTransition { from, to, at });
        self.stage = to;
        self.version += 1;
        self.updated_at = at;
        Ok(())
    }

    /// Whether the optional payloads match the stage.
    ///
    /// Always true for cases built through [`Case::file`] and
    /// [`Case::apply`]; used to reject corrupt rows loaded from storage.
    pub fn payloads_consistent(&self) -> bool {
        let served = self.stage >= CaseStage::Served;
        let heard = self.stage >= CaseStage::HearingScheduled;
        let decided = self.stage == CaseStage::Adjudicated;
        self.service.is_some() == served
            && self.hearing.is_some() == heard
            && self.verdict.is_some() == decided
    }

    fn require_stage(&self, expected: CaseStage, target: CaseStage) -> Result<(), RegistryError> {
        if self.stage != expected {
            return Err(RegistryError::InvalidTransition {
                case_id: self.id,
                from: self.stage,
                to: target,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use efile_core::FilingYear;

    pub(crate) fn filed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 9, 30, 0).unwrap()
    }

    pub(crate) fn sample_case() -> Case {
        let number = CaseNumber::new(FilingYear::new(2024).unwrap(), 1).unwrap();
        Case::file(
            CaseId::new(),
            number,
            PlaintiffRef::Individual(IndividualId::new()),
            Defendant {
                name: "Jane Wanjiru".to_string(),
                defendant_type: DefendantType::Individual,
                email: Some(ContactEmail::new("jane@example.co.ke").unwrap()),
                cellphone: Some("+254700000001".to_string()),
            },
            FilingMetadata {
                title: "Boundary dispute over plot 209".to_string(),
                description: "Encroachment on registered parcel".to_string(),
                court_station: CourtStationId::new(),
                case_type: CaseTypeId::new(),
                case_category: CaseCategoryId::new(),
                advocate: AdvocateId::new(),
                form: None,
                payment: None,
                filed_at: filed_at(),
            },
        )
    }

    fn serve(case: &mut Case) {
        let patch = case.plan_service("Summons issued".into(), filed_at()).unwrap();
        case.apply(patch).unwrap();
    }

    fn schedule(case: &mut Case) {
        let patch = case
            .plan_hearing(
                filed_at() + Duration::days(30),
                "Hon. Justice Mwangi".into(),
                None,
                filed_at() + Duration::days(2),
            )
            .unwrap();
        case.apply(patch).unwrap();
    }

    #[test]
    fn file_creates_case_in_filed_stage() {
        let case = sample_case();
        assert_eq!(case.stage, CaseStage::Filed);
        assert_eq!(case.version, 1);
        assert!(case.transition_log.is_empty());
        assert!(!case.registrar_approval);
        assert!(case.payloads_consistent());
    }

    #[test]
    fn full_lifecycle_filed_to_adjudicated() {
        let mut case = sample_case();
        serve(&mut case);
        assert_eq!(case.stage, CaseStage::Served);
        schedule(&mut case);
        assert_eq!(case.stage, CaseStage::HearingScheduled);

        let patch = case
            .plan_verdict(
                "Judgment for the plaintiff".into(),
                filed_at() + Duration::days(31),
                filed_at() + Duration::days(31),
            )
            .unwrap();
        case.apply(patch).unwrap();

        assert_eq!(case.stage, CaseStage::Adjudicated);
        assert!(case.stage.is_terminal());
        assert_eq!(case.version, 4);
        assert_eq!(case.transition_log.len(), 3);
        assert!(case.payloads_consistent());
        assert_eq!(case.updated_at, filed_at() + Duration::days(31));
    }

    #[test]
    fn verdict_before_hearing_rejected_and_case_unchanged() {
        let case = sample_case();
        let before = case.clone();
        let err = case
            .plan_verdict("premature".into(), filed_at(), filed_at())
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::InvalidTransition {
                case_id: case.id,
                from: CaseStage::Filed,
                to: CaseStage::Adjudicated,
            }
        );
        assert_eq!(case, before);
    }

    #[test]
    fn service_cannot_repeat() {
        let mut case = sample_case();
        serve(&mut case);
        assert!(matches!(
            case.plan_service("again".into(), filed_at()),
            Err(RegistryError::InvalidTransition {
                from: CaseStage::Served,
                to: CaseStage::Served,
                ..
            })
        ));
    }

    #[test]
    fn apply_rechecks_precondition() {
        let mut case = sample_case();
        let stale = case.plan_service("first".into(), filed_at()).unwrap();
        case.apply(stale.clone()).unwrap();
        let snapshot = case.clone();
        assert!(case.apply(stale).is_err());
        assert_eq!(case, snapshot);
    }

    #[test]
    fn transition_table_lists_only_successor() {
        for stage in CaseStage::ALL {
            let expected: Vec<CaseStage> = stage.next().into_iter().collect();
            assert_eq!(stage.valid_transitions(), expected.as_slice());
        }
        assert!(CaseStage::Adjudicated.valid_transitions().is_empty());
    }

    #[test]
    fn stage_names_round_trip() {
        for stage in CaseStage::ALL {
            assert_eq!(CaseStage::parse(stage.as_str()), Some(stage));
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.as_str()));
        }
        assert_eq!(CaseStage::parse("CLOSED"), None);
    }

    #[test]
    fn payloads_inconsistent_when_stage_forged() {
        let mut case = sample_case();
        case.stage = CaseStage::Served;
        assert!(!case.payloads_consistent());
    }

    #[test]
    fn plaintiff_ref_serializes_tagged() {
        let id = OrganizationId::new();
        let json = serde_json::to_value(PlaintiffRef::Organization(id)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "organization", "id": id.to_string()})
        );
        assert_eq!(PlaintiffRef::Organization(id).kind(), PartyKind::Organization);
    }
}

#[cfg(test)]
mod proptests {
    use super::tests::{filed_at, sample_case};
    use super::*;
    use proptest::prelude::*;

    fn patch_for(stage: CaseStage) -> StagePatch {
        match stage {
            CaseStage::Filed => StagePatch::Serve(ServiceRecord {
                message: "m".into(),
                served_at: filed_at(),
            }),
            CaseStage::Served => StagePatch::ScheduleHearing(Hearing {
                date: filed_at(),
                judge: "j".into(),
                notes: None,
                scheduled_at: filed_at(),
            }),
            _ => StagePatch::RecordVerdict(Verdict {
                ruling: "r".into(),
                date: filed_at(),
                recorded_at: filed_at(),
            }),
        }
    }

    proptest! {
        /// Whatever order patches arrive in, the stage only ever moves one
        /// step forward, and only when the patch matches the current stage.
        #[test]
        fn stage_only_advances_forward(order in proptest::collection::vec(0usize..3, 0..12)) {
            let mut case = sample_case();
            for pick in order {
                let patch = patch_for(CaseStage::ALL[pick]);
                let before = case.stage;
                match case.apply(patch.clone()) {
                    Ok(()) => {
                        prop_assert_eq!(patch.required_stage(), before);
                        prop_assert_eq!(Some(case.stage), before.next());
                    }
                    Err(_) => prop_assert_eq!(case.stage, before),
                }
                prop_assert!(case.payloads_consistent());
                prop_assert_eq!(case.version, case.transition_log.len() as u64 + 1);
            }
        }
    }
}
