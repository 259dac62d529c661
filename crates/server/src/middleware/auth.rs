//! Authentication middleware and extractors.
//!
//! Provides extractors that validate the `Authorization: Bearer` access
//! token and expose the authenticated user to route handlers.

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::{StatusCode, header, request::Parts};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use lu_estilo_core::{UserId, UserRole};

use crate::services::auth::AuthService;
use crate::state::AppState;

/// The authenticated caller, as carried by a validated access token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub role: UserRole,
}

/// Extractor that requires a valid access token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that additionally requires the `admin` role.
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when authentication or authorization fails.
pub enum AuthRejection {
    /// Bearer token missing, malformed, or expired.
    Unauthorized,
    /// Token is valid but the caller is not an admin.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "invalid or missing access token",
            ),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "admin privileges required",
            ),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Validate the bearer token in `parts` against the signing key.
fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, AuthRejection> {
    let header_value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthRejection::Unauthorized)?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(AuthRejection::Unauthorized)?;

    let auth = AuthService::new(state.pool(), &state.config().auth);
    let claims = auth
        .verify_access_token(token)
        .map_err(|_| AuthRejection::Unauthorized)?;
    let id = claims.user_id().map_err(|_| AuthRejection::Unauthorized)?;

    Ok(CurrentUser {
        id,
        username: claims.username,
        role: claims.role,
    })
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state)?;
        if user.role != UserRole::Admin {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}
