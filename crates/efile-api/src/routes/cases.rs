//! # Case API Routes
//!
//! HTTP surface for filing cases and moving them through
//! `FILED → SERVED → HEARING_SCHEDULED → ADJUDICATED`.
//!
//! ## Access
//!
//! Advocates file as themselves and only read, list and serve their own
//! cases. The one exception is lookup by case number, which any advocate
//! may use to find a case they were served in.
//! Court staff schedule hearings, record verdicts and list cases per court
//! station. Admins can do everything.
//!
//! ## Concurrency
//!
//! Transition bodies accept an optional `expected_version`. When present
//! and stale the request fails with `409 CONCURRENT_MODIFICATION` before
//! anything is written. Without it the registry still fences its own write
//! on the version it read, so two racing transitions never both commit.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use efile_core::{
    AdvocateId, CaseCategoryId, CaseId, CaseNumber, CaseTypeId, CourtStationId, DefendantType,
    FormId, PartyKind, PaymentId,
};
use efile_registry::{
    Case, DefendantDetails, FilingRequest, HearingRequest, PlaintiffRef, RegistryError,
    ServiceRequest, VerdictRequest,
};

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Registered party bringing the case.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaintiffInput {
    /// `individual` or `organization`.
    pub kind: String,
    /// Id of the registered party.
    pub id: Uuid,
}

/// Defendant details, recorded inline on the case.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DefendantInput {
    pub name: String,
    /// `individual` or `organization`.
    pub defendant_type: String,
    pub email: Option<String>,
    pub cellphone: Option<String>,
}

/// Request to file a new case.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FileCaseRequest {
    pub title: String,
    pub description: String,
    pub court_station_id: Uuid,
    pub case_type_id: Uuid,
    pub case_category_id: Uuid,
    /// Filing advocate. Defaults to the caller for advocate tokens and is
    /// required otherwise.
    pub advocate_id: Option<Uuid>,
    pub plaintiff: PlaintiffInput,
    pub defendant: DefendantInput,
    pub form_id: Option<Uuid>,
    pub payment_id: Option<Uuid>,
}

/// `FILED → SERVED`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordServiceRequest {
    /// Message served on the defendant.
    pub message: String,
    pub expected_version: Option<u64>,
}

/// `SERVED → HEARING_SCHEDULED`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScheduleHearingRequest {
    /// Hearing date (RFC 3339).
    pub date: DateTime<Utc>,
    pub judge: String,
    pub notes: Option<String>,
    pub expected_version: Option<u64>,
}

/// `HEARING_SCHEDULED → ADJUDICATED`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordVerdictRequest {
    pub ruling: String,
    /// Date the ruling was delivered (RFC 3339).
    pub date: DateTime<Utc>,
    pub expected_version: Option<u64>,
}

impl Validate for ScheduleHearingRequest {
    fn validate(&self) -> Result<(), String> {
        if self.judge.trim().is_empty() {
            return Err("judge must not be empty".to_string());
        }
        Ok(())
    }
}

/// A case with its display number and the stages it may move to next.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CaseResponse {
    #[schema(value_type = Object)]
    pub case: Case,
    /// The case number as printed, e.g. `"7/24"`.
    pub case_number_display: String,
    pub valid_transitions: Vec<String>,
}

impl From<Case> for CaseResponse {
    fn from(case: Case) -> Self {
        Self {
            case_number_display: case.case_number.to_string(),
            valid_transitions: case
                .stage
                .valid_transitions()
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            case,
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the case lifecycle router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/cases", post(file_case))
        .route("/v1/cases/:id", get(get_case))
        .route("/v1/cases/by-number/:sequence/:yy", get(find_by_number))
        .route("/v1/cases/:id/service", post(record_service))
        .route("/v1/cases/:id/hearing", post(schedule_hearing))
        .route("/v1/cases/:id/verdict", post(record_verdict))
        .route("/v1/advocates/:id/cases", get(cases_for_advocate))
        .route("/v1/court-stations/:id/cases", get(cases_for_court_station))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn counted(metrics: &ApiMetrics, err: RegistryError) -> AppError {
    metrics.record_failure(&err);
    err.into()
}

fn filing_advocate(caller: &CallerIdentity, requested: Option<Uuid>) -> Result<AdvocateId, AppError> {
    match (caller.advocate_id(), requested) {
        (Some(own), None) => Ok(own),
        (Some(own), Some(id)) if id == *own.as_uuid() => Ok(own),
        (Some(_), Some(_)) => Err(AppError::Forbidden(
            "advocates may only file cases as themselves".to_string(),
        )),
        (None, Some(id)) => Ok(AdvocateId::from_uuid(id)),
        (None, None) => Err(AppError::Validation("advocate_id is required".to_string())),
    }
}

fn ensure_visible(caller: &CallerIdentity, case: &Case) -> Result<(), AppError> {
    if caller.can_view_advocate(&case.filing.advocate) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "case {} was not filed by the calling advocate",
            case.id
        )))
    }
}

fn to_responses(cases: Vec<Case>) -> Vec<CaseResponse> {
    cases.into_iter().map(CaseResponse::from).collect()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/cases: File a new case.
#[utoipa::path(
    post,
    path = "/v1/cases",
    request_body = FileCaseRequest,
    responses(
        (status = 201, description = "Case filed", body = CaseResponse),
        (status = 403, description = "Advocate filing on behalf of another advocate"),
        (status = 422, description = "Validation error or unknown reference"),
        (status = 503, description = "No case number could be allocated"),
    ),
    tag = "cases"
)]
pub(crate) async fn file_case(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<FileCaseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CaseResponse>), AppError> {
    require_role(&caller, Role::Advocate)?;
    let req = extract_json(body)?;
    let advocate = filing_advocate(&caller, req.advocate_id)?;

    let plaintiff_kind: PartyKind = req.plaintiff.kind.parse()?;
    let defendant_type = DefendantType::from(req.defendant.defendant_type.parse::<PartyKind>()?);

    let filing = FilingRequest {
        title: req.title,
        description: req.description,
        court_station: CourtStationId::from_uuid(req.court_station_id),
        case_type: CaseTypeId::from_uuid(req.case_type_id),
        case_category: CaseCategoryId::from_uuid(req.case_category_id),
        advocate,
        plaintiff: PlaintiffRef::from_parts(plaintiff_kind, req.plaintiff.id),
        defendant: DefendantDetails {
            name: req.defendant.name,
            defendant_type,
            email: req.defendant.email,
            cellphone: req.defendant.cellphone,
        },
        form: req.form_id.map(FormId::from_uuid),
        payment: req.payment_id.map(PaymentId::from_uuid),
    };

    let case = state
        .registry
        .file_case(filing)
        .await
        .map_err(|e| counted(&state.metrics, e))?;
    state.metrics.record_filed();

    Ok((StatusCode::CREATED, Json(case.into())))
}

/// GET /v1/cases/:id: Get one case.
#[utoipa::path(
    get,
    path = "/v1/cases/{id}",
    params(("id" = Uuid, Path, description = "Case id")),
    responses(
        (status = 200, description = "Case found", body = CaseResponse),
        (status = 404, description = "Case not found"),
    ),
    tag = "cases"
)]
pub(crate) async fn get_case(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<CaseResponse>, AppError> {
    require_role(&caller, Role::Advocate)?;
    let case = state.registry.get_case(&CaseId::from_uuid(id)).await?;
    ensure_visible(&caller, &case)?;
    Ok(Json(case.into()))
}

/// GET /v1/cases/by-number/:sequence/:yy: Look a case up by its number.
///
/// Open to every advocate, not only the filer: opposing counsel uses the
/// number on the served papers to find the case.
#[utoipa::path(
    get,
    path = "/v1/cases/by-number/{sequence}/{yy}",
    params(
        ("sequence" = u32, Path, description = "Position within the year"),
        ("yy" = u16, Path, description = "Two-digit year, read as 20yy"),
    ),
    responses(
        (status = 200, description = "Case found", body = CaseResponse),
        (status = 404, description = "No case with that number"),
        (status = 422, description = "Malformed case number"),
    ),
    tag = "cases"
)]
pub(crate) async fn find_by_number(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path((sequence, yy)): Path<(u32, u16)>,
) -> Result<Json<CaseResponse>, AppError> {
    require_role(&caller, Role::Advocate)?;
    let number = CaseNumber::from_parts(sequence, yy)?;
    let case = state.registry.find_by_number(&number).await?;
    Ok(Json(case.into()))
}

/// POST /v1/cases/:id/service: Record service on the defendant.
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/service",
    params(("id" = Uuid, Path, description = "Case id")),
    request_body = RecordServiceRequest,
    responses(
        (status = 200, description = "Case served", body = CaseResponse),
        (status = 404, description = "Case not found"),
        (status = 409, description = "Case is not FILED, or was modified concurrently"),
    ),
    tag = "cases"
)]
pub(crate) async fn record_service(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<RecordServiceRequest>, JsonRejection>,
) -> Result<Json<CaseResponse>, AppError> {
    require_role(&caller, Role::Advocate)?;
    let req = extract_json(body)?;
    let case_id = CaseId::from_uuid(id);

    if caller.role == Role::Advocate {
        let current = state.registry.get_case(&case_id).await?;
        ensure_visible(&caller, &current)?;
    }

    let case = state
        .registry
        .record_service(
            &case_id,
            ServiceRequest {
                message: req.message,
                expected_version: req.expected_version,
            },
        )
        .await
        .map_err(|e| counted(&state.metrics, e))?;
    state.metrics.record_transition(case.stage);

    Ok(Json(case.into()))
}

/// POST /v1/cases/:id/hearing: Schedule the hearing.
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/hearing",
    params(("id" = Uuid, Path, description = "Case id")),
    request_body = ScheduleHearingRequest,
    responses(
        (status = 200, description = "Hearing scheduled", body = CaseResponse),
        (status = 403, description = "Court staff role required"),
        (status = 409, description = "Case is not SERVED, or was modified concurrently"),
    ),
    tag = "cases"
)]
pub(crate) async fn schedule_hearing(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<ScheduleHearingRequest>, JsonRejection>,
) -> Result<Json<CaseResponse>, AppError> {
    require_role(&caller, Role::CourtStaff)?;
    let req = extract_validated_json(body)?;

    let case = state
        .registry
        .schedule_hearing(
            &CaseId::from_uuid(id),
            HearingRequest {
                date: req.date,
                judge: req.judge,
                notes: req.notes,
                expected_version: req.expected_version,
            },
        )
        .await
        .map_err(|e| counted(&state.metrics, e))?;
    state.metrics.record_transition(case.stage);

    Ok(Json(case.into()))
}

/// POST /v1/cases/:id/verdict: Record the verdict.
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/verdict",
    params(("id" = Uuid, Path, description = "Case id")),
    request_body = RecordVerdictRequest,
    responses(
        (status = 200, description = "Verdict recorded", body = CaseResponse),
        (status = 403, description = "Court staff role required"),
        (status = 409, description = "Case is not HEARING_SCHEDULED, or was modified concurrently"),
    ),
    tag = "cases"
)]
pub(crate) async fn record_verdict(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<RecordVerdictRequest>, JsonRejection>,
) -> Result<Json<CaseResponse>, AppError> {
    require_role(&caller, Role::CourtStaff)?;
    let req = extract_json(body)?;

    let case = state
        .registry
        .record_verdict(
            &CaseId::from_uuid(id),
            VerdictRequest {
                ruling: req.ruling,
                date: req.date,
                expected_version: req.expected_version,
            },
        )
        .await
        .map_err(|e| counted(&state.metrics, e))?;
    state.metrics.record_transition(case.stage);

    Ok(Json(case.into()))
}

/// GET /v1/advocates/:id/cases: Cases filed by an advocate, newest first.
#[utoipa::path(
    get,
    path = "/v1/advocates/{id}/cases",
    params(("id" = Uuid, Path, description = "Advocate id")),
    responses(
        (status = 200, description = "Cases filed by the advocate", body = Vec<CaseResponse>),
        (status = 403, description = "Advocates may only list their own cases"),
    ),
    tag = "cases"
)]
pub(crate) async fn cases_for_advocate(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CaseResponse>>, AppError> {
    require_role(&caller, Role::Advocate)?;
    let advocate = AdvocateId::from_uuid(id);
    if !caller.can_view_advocate(&advocate) {
        return Err(AppError::Forbidden(
            "advocates may only list their own cases".to_string(),
        ));
    }
    let cases = state.registry.cases_for_advocate(&advocate).await?;
    Ok(Json(to_responses(cases)))
}

/// GET /v1/court-stations/:id/cases: Cases filed at a court station, newest first.
#[utoipa::path(
    get,
    path = "/v1/court-stations/{id}/cases",
    params(("id" = Uuid, Path, description = "Court station id")),
    responses(
        (status = 200, description = "Cases filed at the station", body = Vec<CaseResponse>),
        (status = 403, description = "Court staff role required"),
    ),
    tag = "cases"
)]
pub(crate) async fn cases_for_court_station(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CaseResponse>>, AppError> {
    require_role(&caller, Role::CourtStaff)?;
    let cases = state
        .registry
        .cases_for_court_station(&CourtStationId::from_uuid(id))
        .await?;
    Ok(Json(to_responses(cases)))
}
