//! Authentication routes.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::error::Result;
use crate::models::user::{LoginInput, RefreshInput, RegisterInput, TokenPair, UserResponse};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Register a new user.
///
/// POST /auth/register
///
/// # Errors
///
/// Returns 400 on a malformed email or weak password, 409 when the
/// username or email is taken.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let auth = AuthService::new(state.pool(), &state.config().auth);
    let user = auth.register(&input).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Login with username and password.
///
/// POST /auth/login
///
/// # Errors
///
/// Returns 401 on bad credentials.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<TokenPair>> {
    let auth = AuthService::new(state.pool(), &state.config().auth);
    let pair = auth.login(&input).await?;
    Ok(Json(pair))
}

/// Exchange a refresh token for a fresh token pair.
///
/// POST /auth/refresh
///
/// # Errors
///
/// Returns 401 when the refresh token is unknown, expired, or spent.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshInput>,
) -> Result<Json<TokenPair>> {
    let auth = AuthService::new(state.pool(), &state.config().auth);
    let pair = auth.refresh(&input.refresh_token).await?;
    Ok(Json(pair))
}
