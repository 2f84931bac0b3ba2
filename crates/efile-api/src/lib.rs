//! # efile-api: HTTP Service for the Case Registry
//!
//! Exposes the case registry and its reference data over HTTP.
//!
//! ## API Surface
//!
//! | Prefix                          | Module                  | Domain              |
//! |---------------------------------|-------------------------|---------------------|
//! | `/v1/cases/*`                   | [`routes::cases`]       | Filing and lifecycle |
//! | `/v1/advocates/*/cases`         | [`routes::cases`]       | Advocate listings   |
//! | `/v1/court-stations/*/cases`    | [`routes::cases`]       | Station listings    |
//! | `/v1/court-stations`, `/v1/case-types`, `/v1/case-categories` | [`routes::directory`] | Catalogues |
//! | `/v1/individuals`, `/v1/organizations`, `/v1/advocates` | [`routes::directory`] | Parties |
//! | `/v1/forms`, `/v1/payments`     | [`routes::directory`]   | Filing attachments  |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Generated with utoipa at `/openapi.json`.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health checks (`/health/*`) and `/metrics` are mounted outside the auth
/// middleware so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = state.config.auth_config();
    let metrics = state.metrics.clone();

    let api = Router::new()
        .merge(routes::cases::router())
        .merge(routes::directory::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(axum::Extension(metrics))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .route("/metrics", axum::routing::get(prometheus_metrics))
        .with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// GET /metrics: Prometheus text exposition.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response()
        }
    }
}

/// Liveness check: the process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check: returns 200 "ready", or 503 when the database is
/// configured and unreachable.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "database health check failed");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}
