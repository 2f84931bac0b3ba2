//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "`{role}:{subject_id}:{secret}` or a bare secret (admin). Set via AUTH_TOKEN.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Assembled OpenAPI document for the whole API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "E-Filing Case Registry API",
        version = "0.1.0",
        description = "Case filing and lifecycle for court e-filing.\n\nCases are numbered `<sequence>/<yy>` per calendar year and move strictly through FILED, SERVED, HEARING_SCHEDULED and ADJUDICATED.\n\nAuthentication: `Authorization: Bearer <token>`. All `/v1/*` endpoints require it; `/health/*` and `/metrics` do not.",
        license(name = "AGPL-3.0-or-later")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        // ── Cases ────────────────────────────────────────────────────────
        crate::routes::cases::file_case,
        crate::routes::cases::get_case,
        crate::routes::cases::find_by_number,
        crate::routes::cases::record_service,
        crate::routes::cases::schedule_hearing,
        crate::routes::cases::record_verdict,
        crate::routes::cases::cases_for_advocate,
        crate::routes::cases::cases_for_court_station,
        // ── Reference data ───────────────────────────────────────────────
        crate::routes::directory::create_court_station,
        crate::routes::directory::list_court_stations,
        crate::routes::directory::court_station_exists,
        crate::routes::directory::create_case_type,
        crate::routes::directory::list_case_types,
        crate::routes::directory::case_type_exists,
        crate::routes::directory::create_case_category,
        crate::routes::directory::list_case_categories,
        crate::routes::directory::case_category_exists,
        // ── Parties ──────────────────────────────────────────────────────
        crate::routes::directory::create_individual,
        crate::routes::directory::list_individuals,
        crate::routes::directory::create_organization,
        crate::routes::directory::list_organizations,
        crate::routes::directory::create_advocate,
        crate::routes::directory::list_advocates,
        crate::routes::directory::advocate_exists,
        // ── Court staff ──────────────────────────────────────────────────
        crate::routes::directory::create_court_staff,
        crate::routes::directory::court_staff_exists,
        crate::routes::directory::station_staff,
        // ── Filings ──────────────────────────────────────────────────────
        crate::routes::directory::create_form,
        crate::routes::directory::create_payment,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            crate::auth::Role,
            crate::routes::cases::FileCaseRequest,
            crate::routes::cases::PlaintiffInput,
            crate::routes::cases::DefendantInput,
            crate::routes::cases::RecordServiceRequest,
            crate::routes::cases::ScheduleHearingRequest,
            crate::routes::cases::RecordVerdictRequest,
            crate::routes::cases::CaseResponse,
            crate::routes::directory::RegisterNameRequest,
            crate::routes::directory::RegisterAdvocateRequest,
            crate::routes::directory::RegisterCourtStaffRequest,
            crate::routes::directory::RecordFormRequest,
            crate::routes::directory::RecordPaymentRequest,
            crate::routes::directory::ExistsResponse,
            crate::routes::directory::DirectoryEntryResponse,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "cases", description = "Filing, stage transitions, lookups and listings"),
        (name = "reference-data", description = "Court stations, case types and case categories"),
        (name = "parties", description = "Individuals, organizations and advocates"),
        (name = "court-staff", description = "Per-station staff roster, one holder per role"),
        (name = "filings", description = "Filing forms and fee payments"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
