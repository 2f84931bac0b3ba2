//! # Reference Data Routes
//!
//! Court stations, case types and case categories (the catalogues), the
//! parties and advocates a filing points at, filing forms and fee
//! payments, and each station's staff roster. Filing resolves every
//! reference against this data before a case number is spent.
//!
//! Admins maintain the catalogues, the advocate roll and the staff roster.
//! Any authenticated caller may read the catalogues and register parties,
//! forms and payments. Station rosters are visible to court staff.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use efile_core::{ContactEmail, CourtStationId};
use efile_registry::{
    DirectoryEntry, NewAdvocate, NewCourtStaff, NewPayment, ReferenceKind, StaffRole,
};

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Register a named record (catalogue entry or party).
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterNameRequest {
    pub name: String,
}

impl Validate for RegisterNameRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        Ok(())
    }
}

/// Register an advocate.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterAdvocateRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Law society practice number.
    pub practice_number: u32,
    pub cellphone: Option<String>,
}

impl Validate for RegisterAdvocateRequest {
    fn validate(&self) -> Result<(), String> {
        if self.practice_number == 0 {
            return Err("practice_number must be positive".to_string());
        }
        Ok(())
    }
}

/// Put a member on a station's staff roster.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterCourtStaffRequest {
    pub court_station_id: Uuid,
    /// `court_admin`, `deputy_registrar` or `court_assistant`.
    #[schema(example = "deputy_registrar")]
    pub role: String,
    pub username: String,
}

impl Validate for RegisterCourtStaffRequest {
    fn validate(&self) -> Result<(), String> {
        self.role.parse::<StaffRole>()?;
        if self.username.trim().is_empty() {
            return Err("username must not be empty".to_string());
        }
        Ok(())
    }
}

/// Record a filing form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordFormRequest {
    pub form_type: String,
}

impl Validate for RecordFormRequest {
    fn validate(&self) -> Result<(), String> {
        if self.form_type.trim().is_empty() {
            return Err("form_type must not be empty".to_string());
        }
        Ok(())
    }
}

/// Record a filing-fee payment.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordPaymentRequest {
    /// External receipt reference.
    pub reference: String,
    /// Amount in the smallest currency unit.
    pub amount: u64,
    pub phone: Option<String>,
}

impl Validate for RecordPaymentRequest {
    fn validate(&self) -> Result<(), String> {
        if self.amount == 0 {
            return Err("amount must be positive".to_string());
        }
        Ok(())
    }
}

/// `?name=` for existence checks.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NameQuery {
    /// Name to look for, ignoring case.
    pub name: String,
}

/// `?practice_number=` for the advocate roll check.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PracticeNumberQuery {
    pub practice_number: u32,
}

/// `?court_station_id=&role=` for staff roster checks.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StaffRoleQuery {
    pub court_station_id: Uuid,
    /// `court_admin`, `deputy_registrar` or `court_assistant`.
    pub role: String,
}

/// Result of an existence check.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExistsResponse {
    pub exists: bool,
}

/// One reference-data record.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DirectoryEntryResponse {
    pub id: Uuid,
    /// e.g. `court_station`, `advocate`.
    pub kind: String,
    pub name: String,
    #[schema(value_type = Object)]
    pub attributes: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<DirectoryEntry> for DirectoryEntryResponse {
    fn from(entry: DirectoryEntry) -> Self {
        Self {
            id: entry.id,
            kind: entry.kind.as_str().to_string(),
            name: entry.name,
            attributes: entry.attributes,
            created_at: entry.created_at,
        }
    }
}

type Created = (StatusCode, Json<DirectoryEntryResponse>);

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the reference data router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/court-stations",
            post(create_court_station).get(list_court_stations),
        )
        .route("/v1/court-stations/exists", get(court_station_exists))
        .route("/v1/case-types", post(create_case_type).get(list_case_types))
        .route("/v1/case-types/exists", get(case_type_exists))
        .route(
            "/v1/case-categories",
            post(create_case_category).get(list_case_categories),
        )
        .route("/v1/case-categories/exists", get(case_category_exists))
        .route("/v1/individuals", post(create_individual).get(list_individuals))
        .route(
            "/v1/organizations",
            post(create_organization).get(list_organizations),
        )
        .route("/v1/advocates", post(create_advocate).get(list_advocates))
        .route("/v1/advocates/exists", get(advocate_exists))
        .route("/v1/court-staff", post(create_court_staff))
        .route("/v1/court-staff/exists", get(court_staff_exists))
        .route("/v1/court-stations/:id/staff", get(station_staff))
        .route("/v1/forms", post(create_form))
        .route("/v1/payments", post(create_payment))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn register_named(
    state: &AppState,
    kind: ReferenceKind,
    body: Result<Json<RegisterNameRequest>, JsonRejection>,
) -> Result<Created, AppError> {
    let req = extract_validated_json(body)?;
    let entry = state
        .directory
        .register(kind, &req.name, serde_json::json!({}))
        .await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

async fn list_kind(
    state: &AppState,
    kind: ReferenceKind,
) -> Result<Json<Vec<DirectoryEntryResponse>>, AppError> {
    let entries = state.directory.list(kind).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

// ---------------------------------------------------------------------------
// Catalogues
// ---------------------------------------------------------------------------

/// POST /v1/court-stations: Register a court station.
#[utoipa::path(
    post,
    path = "/v1/court-stations",
    request_body = RegisterNameRequest,
    responses(
        (status = 201, description = "Court station registered", body = DirectoryEntryResponse),
        (status = 409, description = "A court station with that name exists"),
    ),
    tag = "reference-data"
)]
pub(crate) async fn create_court_station(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RegisterNameRequest>, JsonRejection>,
) -> Result<Created, AppError> {
    require_role(&caller, Role::Admin)?;
    register_named(&state, ReferenceKind::CourtStation, body).await
}

/// GET /v1/court-stations: List court stations by name.
#[utoipa::path(
    get,
    path = "/v1/court-stations",
    responses((status = 200, description = "Court stations", body = Vec<DirectoryEntryResponse>)),
    tag = "reference-data"
)]
pub(crate) async fn list_court_stations(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<DirectoryEntryResponse>>, AppError> {
    require_role(&caller, Role::Advocate)?;
    list_kind(&state, ReferenceKind::CourtStation).await
}

/// GET /v1/court-stations/exists: Whether a court station name is taken.
#[utoipa::path(
    get,
    path = "/v1/court-stations/exists",
    params(NameQuery),
    responses((status = 200, description = "Existence check", body = ExistsResponse)),
    tag = "reference-data"
)]
pub(crate) async fn court_station_exists(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<NameQuery>,
) -> Result<Json<ExistsResponse>, AppError> {
    require_role(&caller, Role::Advocate)?;
    let exists = state.directory.court_station_exists(&query.name).await?;
    Ok(Json(ExistsResponse { exists }))
}

/// POST /v1/case-types: Register a case type.
#[utoipa::path(
    post,
    path = "/v1/case-types",
    request_body = RegisterNameRequest,
    responses(
        (status = 201, description = "Case type registered", body = DirectoryEntryResponse),
        (status = 409, description = "A case type with that name exists"),
    ),
    tag = "reference-data"
)]
pub(crate) async fn create_case_type(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RegisterNameRequest>, JsonRejection>,
) -> Result<Created, AppError> {
    require_role(&caller, Role::Admin)?;
    register_named(&state, ReferenceKind::CaseType, body).await
}

/// GET /v1/case-types: List case types by name.
#[utoipa::path(
    get,
    path = "/v1/case-types",
    responses((status = 200, description = "Case types", body = Vec<DirectoryEntryResponse>)),
    tag = "reference-data"
)]
pub(crate) async fn list_case_types(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<DirectoryEntryResponse>>, AppError> {
    require_role(&caller, Role::Advocate)?;
    list_kind(&state, ReferenceKind::CaseType).await
}

/// GET /v1/case-types/exists: Whether a case type name is taken.
#[utoipa::path(
    get,
    path = "/v1/case-types/exists",
    params(NameQuery),
    responses((status = 200, description = "Existence check", body = ExistsResponse)),
    tag = "reference-data"
)]
pub(crate) async fn case_type_exists(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<NameQuery>,
) -> Result<Json<ExistsResponse>, AppError> {
    require_role(&caller, Role::Advocate)?;
    let exists = state.directory.case_type_exists(&query.name).await?;
    Ok(Json(ExistsResponse { exists }))
}

/// POST /v1/case-categories: Register a case category.
#[utoipa::path(
    post,
    path = "/v1/case-categories",
    request_body = RegisterNameRequest,
    responses(
        (status = 201, description = "Case category registered", body = DirectoryEntryResponse),
        (status = 409, description = "A case category with that name exists"),
    ),
    tag = "reference-data"
)]
pub(crate) async fn create_case_category(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RegisterNameRequest>, JsonRejection>,
) -> Result<Created, AppError> {
    require_role(&caller, Role::Admin)?;
    register_named(&state, ReferenceKind::CaseCategory, body).await
}

/// GET /v1/case-categories: List case categories by name.
#[utoipa::path(
    get,
    path = "/v1/case-categories",
    responses((status = 200, description = "Case categories", body = Vec<DirectoryEntryResponse>)),
    tag = "reference-data"
)]
pub(crate) async fn list_case_categories(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<DirectoryEntryResponse>>, AppError> {
    require_role(&caller, Role::Advocate)?;
    list_kind(&state, ReferenceKind::CaseCategory).await
}

/// GET /v1/case-categories/exists: Whether a case category name is taken.
#[utoipa::path(
    get,
    path = "/v1/case-categories/exists",
    params(NameQuery),
    responses((status = 200, description = "Existence check", body = ExistsResponse)),
    tag = "reference-data"
)]
pub(crate) async fn case_category_exists(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<NameQuery>,
) -> Result<Json<ExistsResponse>, AppError> {
    require_role(&caller, Role::Advocate)?;
    let exists = state.directory.case_category_exists(&query.name).await?;
    Ok(Json(ExistsResponse { exists }))
}

// ---------------------------------------------------------------------------
// Parties and advocates
// ---------------------------------------------------------------------------

/// POST /v1/individuals: Register an individual party.
#[utoipa::path(
    post,
    path = "/v1/individuals",
    request_body = RegisterNameRequest,
    responses((status = 201, description = "Individual registered", body = DirectoryEntryResponse)),
    tag = "parties"
)]
pub(crate) async fn create_individual(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RegisterNameRequest>, JsonRejection>,
) -> Result<Created, AppError> {
    require_role(&caller, Role::Advocate)?;
    register_named(&state, ReferenceKind::Individual, body).await
}

/// GET /v1/individuals: List individual parties.
#[utoipa::path(
    get,
    path = "/v1/individuals",
    responses((status = 200, description = "Individuals", body = Vec<DirectoryEntryResponse>)),
    tag = "parties"
)]
pub(crate) async fn list_individuals(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<DirectoryEntryResponse>>, AppError> {
    require_role(&caller, Role::Advocate)?;
    list_kind(&state, ReferenceKind::Individual).await
}

/// POST /v1/organizations: Register an organization party.
#[utoipa::path(
    post,
    path = "/v1/organizations",
    request_body = RegisterNameRequest,
    responses((status = 201, description = "Organization registered", body = DirectoryEntryResponse)),
    tag = "parties"
)]
pub(crate) async fn create_organization(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RegisterNameRequest>, JsonRejection>,
) -> Result<Created, AppError> {
    require_role(&caller, Role::Advocate)?;
    register_named(&state, ReferenceKind::Organization, body).await
}

/// GET /v1/organizations: List organization parties.
#[utoipa::path(
    get,
    path = "/v1/organizations",
    responses((status = 200, description = "Organizations", body = Vec<DirectoryEntryResponse>)),
    tag = "parties"
)]
pub(crate) async fn list_organizations(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<DirectoryEntryResponse>>, AppError> {
    require_role(&caller, Role::Advocate)?;
    list_kind(&state, ReferenceKind::Organization).await
}

/// POST /v1/advocates: Add an advocate to the roll.
#[utoipa::path(
    post,
    path = "/v1/advocates",
    request_body = RegisterAdvocateRequest,
    responses(
        (status = 201, description = "Advocate registered", body = DirectoryEntryResponse),
        (status = 403, description = "Admin role required"),
        (status = 422, description = "Validation error"),
    ),
    tag = "parties"
)]
pub(crate) async fn create_advocate(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RegisterAdvocateRequest>, JsonRejection>,
) -> Result<Created, AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_validated_json(body)?;
    let (_, entry) = state
        .directory
        .register_advocate(NewAdvocate {
            first_name: req.first_name,
            last_name: req.last_name,
            email: ContactEmail::new(req.email)?,
            practice_number: req.practice_number,
            cellphone: req.cellphone,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// GET /v1/advocates: List advocates.
#[utoipa::path(
    get,
    path = "/v1/advocates",
    responses((status = 200, description = "Advocates", body = Vec<DirectoryEntryResponse>)),
    tag = "parties"
)]
pub(crate) async fn list_advocates(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<DirectoryEntryResponse>>, AppError> {
    require_role(&caller, Role::Advocate)?;
    list_kind(&state, ReferenceKind::Advocate).await
}

/// GET /v1/advocates/exists: Whether a practice number is on the roll.
#[utoipa::path(
    get,
    path = "/v1/advocates/exists",
    params(PracticeNumberQuery),
    responses((status = 200, description = "Existence check", body = ExistsResponse)),
    tag = "parties"
)]
pub(crate) async fn advocate_exists(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<PracticeNumberQuery>,
) -> Result<Json<ExistsResponse>, AppError> {
    require_role(&caller, Role::Advocate)?;
    let exists = state.directory.advocate_exists(query.practice_number).await?;
    Ok(Json(ExistsResponse { exists }))
}

// ---------------------------------------------------------------------------
// Court staff
// ---------------------------------------------------------------------------

fn parse_staff_role(role: &str) -> Result<StaffRole, AppError> {
    role.parse().map_err(AppError::Validation)
}

/// POST /v1/court-staff: Fill a role on a station's roster.
#[utoipa::path(
    post,
    path = "/v1/court-staff",
    request_body = RegisterCourtStaffRequest,
    responses(
        (status = 201, description = "Staff member registered", body = DirectoryEntryResponse),
        (status = 403, description = "Admin role required"),
        (status = 409, description = "The role is already filled at that station"),
        (status = 422, description = "Unknown role or court station"),
    ),
    tag = "court-staff"
)]
pub(crate) async fn create_court_staff(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RegisterCourtStaffRequest>, JsonRejection>,
) -> Result<Created, AppError> {
    require_role(&caller, Role::Admin)?;
    let req = extract_validated_json(body)?;
    let entry = state
        .directory
        .register_court_staff(NewCourtStaff {
            court_station: CourtStationId::from_uuid(req.court_station_id),
            role: parse_staff_role(&req.role)?,
            username: req.username,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// GET /v1/court-staff/exists: Whether a role is filled at a station.
#[utoipa::path(
    get,
    path = "/v1/court-staff/exists",
    params(StaffRoleQuery),
    responses(
        (status = 200, description = "Existence check", body = ExistsResponse),
        (status = 422, description = "Unknown role"),
    ),
    tag = "court-staff"
)]
pub(crate) async fn court_staff_exists(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<StaffRoleQuery>,
) -> Result<Json<ExistsResponse>, AppError> {
    require_role(&caller, Role::Advocate)?;
    let role = parse_staff_role(&query.role)?;
    let exists = state
        .directory
        .court_staff_exists(&CourtStationId::from_uuid(query.court_station_id), role)
        .await?;
    Ok(Json(ExistsResponse { exists }))
}

/// GET /v1/court-stations/:id/staff: A station's staff roster.
#[utoipa::path(
    get,
    path = "/v1/court-stations/{id}/staff",
    params(("id" = Uuid, Path, description = "Court station id")),
    responses((status = 200, description = "Roster", body = Vec<DirectoryEntryResponse>)),
    tag = "court-staff"
)]
pub(crate) async fn station_staff(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DirectoryEntryResponse>>, AppError> {
    require_role(&caller, Role::CourtStaff)?;
    let roster = state
        .directory
        .station_staff(&CourtStationId::from_uuid(id))
        .await?;
    Ok(Json(roster.into_iter().map(Into::into).collect()))
}

// ---------------------------------------------------------------------------
// Forms and payments
// ---------------------------------------------------------------------------

/// POST /v1/forms: Record a filing form.
#[utoipa::path(
    post,
    path = "/v1/forms",
    request_body = RecordFormRequest,
    responses((status = 201, description = "Form recorded", body = DirectoryEntryResponse)),
    tag = "filings"
)]
pub(crate) async fn create_form(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RecordFormRequest>, JsonRejection>,
) -> Result<Created, AppError> {
    require_role(&caller, Role::Advocate)?;
    let req = extract_validated_json(body)?;
    let (_, entry) = state.directory.register_form(&req.form_type).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// POST /v1/payments: Record a filing-fee payment.
#[utoipa::path(
    post,
    path = "/v1/payments",
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = DirectoryEntryResponse),
        (status = 422, description = "Validation error"),
    ),
    tag = "filings"
)]
pub(crate) async fn create_payment(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RecordPaymentRequest>, JsonRejection>,
) -> Result<Created, AppError> {
    require_role(&caller, Role::Advocate)?;
    let req = extract_validated_json(body)?;
    let (_, entry) = state
        .directory
        .register_payment(NewPayment {
            reference: req.reference,
            amount: req.amount,
            phone: req.phone,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use axum::middleware::from_fn;
    use axum::Extension;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{auth_middleware, AuthConfig};
    use crate::state::AppConfig;

    fn test_app(state: AppState, token: Option<&str>) -> Router {
        router()
            .with_state(state)
            .layer(from_fn(auth_middleware))
            .layer(Extension(AuthConfig {
                token: token.map(String::from),
            }))
    }

    fn state() -> AppState {
        AppState::in_memory(AppConfig::default()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, auth: Option<&str>, json: serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        builder
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap()
    }

    fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn register_and_list_court_stations() {
        let app = test_app(state(), None);
        for name in ["Mombasa", "Kisumu"] {
            let resp = app
                .clone()
                .oneshot(post("/v1/court-stations", None, serde_json::json!({ "name": name })))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let resp = app.oneshot(get("/v1/court-stations", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Kisumu", "Mombasa"]);
        assert_eq!(body[0]["kind"], "court_station");
    }

    #[tokio::test]
    async fn duplicate_catalogue_name_conflicts() {
        let app = test_app(state(), None);
        let first = app
            .clone()
            .oneshot(post("/v1/case-types", None, serde_json::json!({ "name": "Civil" })))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .oneshot(post("/v1/case-types", None, serde_json::json!({ "name": "civil" })))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(second).await["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn exists_ignores_case() {
        let app = test_app(state(), None);
        app.clone()
            .oneshot(post(
                "/v1/case-categories",
                None,
                serde_json::json!({ "name": "Land and Environment" }),
            ))
            .await
            .unwrap();

        let resp = app
            .clone()
            .oneshot(get("/v1/case-categories/exists?name=land%20and%20environment", None))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["exists"], true);

        let resp = app
            .oneshot(get("/v1/case-categories/exists?name=Family", None))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["exists"], false);
    }

    #[tokio::test]
    async fn blank_name_is_unprocessable() {
        let app = test_app(state(), None);
        let resp = app
            .oneshot(post("/v1/individuals", None, serde_json::json!({ "name": "   " })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn advocate_registration_requires_admin_and_valid_email() {
        let app = test_app(state(), Some("s3cret"));
        let body = serde_json::json!({
            "first_name": "Wanjiru",
            "last_name": "Kamau",
            "email": "wanjiru@example.com",
            "practice_number": 4411
        });

        let staff = app
            .clone()
            .oneshot(post("/v1/advocates", Some("Bearer court_staff::s3cret"), body.clone()))
            .await
            .unwrap();
        assert_eq!(staff.status(), StatusCode::FORBIDDEN);

        let admin = app
            .clone()
            .oneshot(post("/v1/advocates", Some("Bearer s3cret"), body))
            .await
            .unwrap();
        assert_eq!(admin.status(), StatusCode::CREATED);
        let created = body_json(admin).await;
        assert_eq!(created["name"], "Wanjiru Kamau");
        assert_eq!(created["attributes"]["practice_number"], 4411);

        let bad_email = app
            .oneshot(post(
                "/v1/advocates",
                Some("Bearer s3cret"),
                serde_json::json!({
                    "first_name": "Otieno",
                    "last_name": "Odhiambo",
                    "email": "not-an-email",
                    "practice_number": 12
                }),
            ))
            .await
            .unwrap();
        assert_eq!(bad_email.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn advocates_cannot_edit_catalogues() {
        let app = test_app(state(), Some("s3cret"));
        let token = format!("Bearer advocate:{}:s3cret", Uuid::new_v4());
        let resp = app
            .clone()
            .oneshot(post("/v1/court-stations", Some(&token), serde_json::json!({ "name": "Nakuru" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = app.oneshot(get("/v1/court-stations", Some(&token))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    fn advocate_body(practice_number: u32) -> serde_json::Value {
        serde_json::json!({
            "first_name": "Wanjiru",
            "last_name": "Kamau",
            "email": "wanjiru@example.com",
            "practice_number": practice_number
        })
    }

    #[tokio::test]
    async fn duplicate_practice_number_conflicts() {
        let app = test_app(state(), None);
        let first = app
            .clone()
            .oneshot(post("/v1/advocates", None, advocate_body(4411)))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .clone()
            .oneshot(post("/v1/advocates", None, advocate_body(4411)))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);

        let resp = app
            .clone()
            .oneshot(get("/v1/advocates/exists?practice_number=4411", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["exists"], true);

        let resp = app
            .oneshot(get("/v1/advocates/exists?practice_number=4412", None))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["exists"], false);
    }

    #[tokio::test]
    async fn staff_roster_has_one_holder_per_role() {
        let state = state();
        let (station, _) = state.directory.register_court_station("Milimani").await.unwrap();
        let app = test_app(state, Some("s3cret"));
        let staff = |role: &str, username: &str| {
            serde_json::json!({ "court_station_id": station, "role": role, "username": username })
        };

        let resp = app
            .clone()
            .oneshot(post(
                "/v1/court-staff",
                Some("Bearer s3cret"),
                staff("deputy_registrar", "dr.milimani"),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(body_json(resp).await["kind"], "court_staff");

        let resp = app
            .clone()
            .oneshot(post(
                "/v1/court-staff",
                Some("Bearer s3cret"),
                staff("deputy_registrar", "dr.other"),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = app
            .clone()
            .oneshot(post(
                "/v1/court-staff",
                Some("Bearer s3cret"),
                staff("registrar", "dr.other"),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = app
            .clone()
            .oneshot(post(
                "/v1/court-staff",
                Some("Bearer court_staff::s3cret"),
                staff("court_assistant", "ca.milimani"),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let uri = format!("/v1/court-staff/exists?court_station_id={station}&role=deputy_registrar");
        let resp = app.clone().oneshot(get(&uri, Some("Bearer s3cret"))).await.unwrap();
        assert_eq!(body_json(resp).await["exists"], true);
        let uri = format!("/v1/court-staff/exists?court_station_id={station}&role=court_admin");
        let resp = app.clone().oneshot(get(&uri, Some("Bearer s3cret"))).await.unwrap();
        assert_eq!(body_json(resp).await["exists"], false);

        let resp = app
            .oneshot(get(
                &format!("/v1/court-stations/{station}/staff"),
                Some("Bearer court_staff::s3cret"),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let roster = body_json(resp).await;
        assert_eq!(roster.as_array().unwrap().len(), 1);
        assert_eq!(roster[0]["name"], "dr.milimani");
        assert_eq!(roster[0]["attributes"]["role"], "deputy_registrar");
    }

    #[tokio::test]
    async fn payments_and_forms_are_recorded() {
        let app = test_app(state(), None);
        let resp = app
            .clone()
            .oneshot(post(
                "/v1/payments",
                None,
                serde_json::json!({ "reference": "QFT7H2K9LM", "amount": 150000, "phone": "+254700000001" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(body_json(resp).await["kind"], "payment");

        let zero = app
            .clone()
            .oneshot(post(
                "/v1/payments",
                None,
                serde_json::json!({ "reference": "QFT7H2K9LN", "amount": 0 }),
            ))
            .await
            .unwrap();
        assert_eq!(zero.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let form = app
            .oneshot(post("/v1/forms", None, serde_json::json!({ "form_type": "Plaint" })))
            .await
            .unwrap();
        assert_eq!(form.status(), StatusCode::CREATED);
    }
}
