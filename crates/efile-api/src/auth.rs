//! # Authentication & Authorization Middleware
//!
//! Bearer token middleware with court roles.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {role}:{subject_id}:{secret}   role-scoped
//! Bearer {secret}                        legacy format (treated as Admin)
//! ```
//!
//! For the `advocate` role the subject id is the advocate's registered id
//! and scopes filing and listing to that advocate. Staff and admins may
//! leave it empty.
//!
//! ## CallerIdentity
//!
//! Every authenticated request gets a [`CallerIdentity`] injected into the
//! request extensions. Handlers extract it via the `FromRequestParts` impl.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::ToSchema;
use uuid::Uuid;

use efile_core::AdvocateId;

use crate::error::{AppError, ErrorBody, ErrorDetail};

// ── Role ────────────────────────────────────────────────────────────────────

/// Roles, ordered by privilege: `Advocate < CourtStaff < Admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Files cases and serves defendants on its own cases.
    Advocate,
    /// Schedules hearings and records verdicts at court stations.
    CourtStaff,
    /// Manages reference data and advocates.
    Admin,
}

impl Role {
    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Advocate => "advocate",
            Self::CourtStaff => "court_staff",
            Self::Admin => "admin",
        }
    }
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The caller's role in the system.
    pub role: Role,
    /// Bound subject id. For advocates, the advocate id.
    pub subject_id: Option<Uuid>,
}

impl CallerIdentity {
    /// Full-access identity used when auth is disabled.
    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            subject_id: None,
        }
    }

    /// Check if the caller has at least the given minimum role.
    pub fn has_role(&self, minimum: Role) -> bool {
        self.role >= minimum
    }

    /// The advocate this caller acts as, if it is an advocate with a
    /// bound subject id.
    pub fn advocate_id(&self) -> Option<AdvocateId> {
        match (self.role, self.subject_id) {
            (Role::Advocate, Some(id)) => Some(AdvocateId::from_uuid(id)),
            _ => None,
        }
    }

    /// Whether the caller may see cases filed by `advocate`.
    ///
    /// Staff and admins see everything; advocates only their own filings.
    pub fn can_view_advocate(&self, advocate: &AdvocateId) -> bool {
        match self.role {
            Role::Admin | Role::CourtStaff => true,
            Role::Advocate => self.advocate_id().as_ref() == Some(advocate),
        }
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Check that the caller has at least the required role.
pub fn require_role(caller: &CallerIdentity, minimum: Role) -> Result<(), AppError> {
    if caller.has_role(minimum) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' required, caller has '{}'",
            minimum.as_str(),
            caller.role.as_str()
        )))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse the bearer token in format `{role}:{subject_id}:{secret}` or
/// `{secret}` (legacy, treated as `Admin`).
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();

    match parts.as_slice() {
        [secret] => {
            if constant_time_token_eq(secret, expected_secret) {
                Ok(CallerIdentity::admin())
            } else {
                Err("invalid bearer token".into())
            }
        }
        [role_str, subject_str, secret] => {
            if !constant_time_token_eq(secret, expected_secret) {
                return Err("invalid bearer token".into());
            }

            let role = match *role_str {
                "admin" => Role::Admin,
                "court_staff" => Role::CourtStaff,
                "advocate" => Role::Advocate,
                other => return Err(format!("unknown role: {other}")),
            };

            let subject_id = if subject_str.is_empty() {
                None
            } else {
                Some(
                    subject_str
                        .parse::<Uuid>()
                        .map_err(|e| format!("invalid subject_id: {e}"))?,
                )
            };

            if role == Role::Advocate && subject_id.is_none() {
                return Err("advocate tokens must carry the advocate id".into());
            }

            Ok(CallerIdentity { role, subject_id })
        }
        _ => Err("invalid token format, expected {role}:{subject_id}:{secret} or {secret}".into()),
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Extract and validate the Bearer token from the Authorization header.
///
/// When `AuthConfig.token` is `None`, every request runs as `Admin`.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request.extensions().get::<AuthConfig>().cloned();

    match expected_token {
        Some(AuthConfig {
            token: Some(ref expected),
        }) => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match auth_header.and_then(|v| v.strip_prefix("Bearer ")) {
                Some(provided) => match parse_bearer_token(provided, expected) {
                    Ok(identity) => {
                        request.extensions_mut().insert(identity);
                        next.run(request).await
                    }
                    Err(msg) => {
                        tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                        unauthorized_response(&msg)
                    }
                },
                None if auth_header.is_some() => {
                    tracing::warn!("authentication failed: non-Bearer authorization scheme");
                    unauthorized_response("authorization header must use Bearer scheme")
                }
                None => {
                    tracing::warn!("authentication failed: missing authorization header");
                    unauthorized_response("missing authorization header")
                }
            }
        }
        _ => {
            request.extensions_mut().insert(CallerIdentity::admin());
            next.run(request).await
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app(token: Option<String>) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|caller: CallerIdentity| async move { caller.role.as_str() }),
            )
            .layer(from_fn(auth_middleware))
            .layer(axum::Extension(AuthConfig { token }))
    }

    async fn call(app: Router, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn legacy_token_is_admin() {
        let (status, body) = call(test_app(Some("s3cret".into())), Some("Bearer s3cret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "admin");
    }

    #[tokio::test]
    async fn role_scoped_token_sets_role() {
        let token = format!("Bearer advocate:{}:s3cret", Uuid::new_v4());
        let (status, body) = call(test_app(Some("s3cret".into())), Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "advocate");

        let (status, body) =
            call(test_app(Some("s3cret".into())), Some("Bearer court_staff::s3cret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "court_staff");
    }

    #[tokio::test]
    async fn missing_header_rejected() {
        let (status, body) = call(test_app(Some("s3cret".into())), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("missing"));
    }

    #[tokio::test]
    async fn wrong_secret_rejected() {
        let (status, body) = call(test_app(Some("s3cret".into())), Some("Bearer nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("UNAUTHORIZED"));
    }

    #[tokio::test]
    async fn basic_scheme_rejected() {
        let (status, body) =
            call(test_app(Some("s3cret".into())), Some("Basic dXNlcjpwYXNz")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Bearer scheme"));
    }

    #[tokio::test]
    async fn auth_disabled_runs_as_admin() {
        let (status, body) = call(test_app(None), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "admin");
    }

    #[test]
    fn role_ordering() {
        assert!(Role::Advocate < Role::CourtStaff);
        assert!(Role::CourtStaff < Role::Admin);
    }

    #[test]
    fn advocate_token_requires_subject() {
        assert!(parse_bearer_token("advocate::s3cret", "s3cret").is_err());
    }

    #[test]
    fn unknown_role_and_bad_uuid_rejected() {
        assert!(parse_bearer_token("judge::s3cret", "s3cret")
            .unwrap_err()
            .contains("unknown role"));
        assert!(parse_bearer_token("advocate:not-a-uuid:s3cret", "s3cret")
            .unwrap_err()
            .contains("subject_id"));
        assert!(parse_bearer_token("admin:s3cret", "s3cret").is_err());
    }

    #[test]
    fn advocates_see_only_their_own_cases() {
        let own = AdvocateId::new();
        let caller = CallerIdentity {
            role: Role::Advocate,
            subject_id: Some(*own.as_uuid()),
        };
        assert!(caller.can_view_advocate(&own));
        assert!(!caller.can_view_advocate(&AdvocateId::new()));

        let staff = CallerIdentity {
            role: Role::CourtStaff,
            subject_id: None,
        };
        assert!(staff.can_view_advocate(&own));
        assert!(staff.advocate_id().is_none());
    }

    #[test]
    fn require_role_forbids_lower_roles() {
        let caller = CallerIdentity {
            role: Role::Advocate,
            subject_id: Some(Uuid::new_v4()),
        };
        assert!(require_role(&caller, Role::Advocate).is_ok());
        assert!(matches!(
            require_role(&caller, Role::CourtStaff),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn auth_config_debug_redacts_token() {
        let debug = format!("{:?}", AuthConfig { token: Some("top-secret".into()) });
        assert!(!debug.contains("top-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
