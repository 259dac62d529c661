//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; responses carry a JSON body of the shape
//! `{"detail": "..."}` with internal details hidden on 500s.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::customers::CustomerError;
use crate::services::orders::OrderError;
use crate::services::products::ProductError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Customer operation failed.
    #[error("Customer error: {0}")]
    Customer(#[from] CustomerError),

    /// Product operation failed.
    #[error("Product error: {0}")]
    Product(#[from] ProductError),

    /// Order lifecycle operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated user lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Internal(_) => true,
            Self::Auth(e) => matches!(e, AuthError::Repository(_) | AuthError::PasswordHash),
            Self::Customer(e) => matches!(e, CustomerError::Repository(_)),
            Self::Product(e) => matches!(e, ProductError::Repository(_)),
            Self::Order(e) => matches!(e, OrderError::Repository(_)),
            Self::Unauthorized(_) | Self::Forbidden(_) => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(e) => match e {
                AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Customer(e) => match e {
                CustomerError::Validation(_) => StatusCode::BAD_REQUEST,
                CustomerError::NotFound(_) => StatusCode::NOT_FOUND,
                CustomerError::Conflict(_) => StatusCode::CONFLICT,
                CustomerError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Product(e) => match e {
                ProductError::Validation(_) => StatusCode::BAD_REQUEST,
                ProductError::NotFound(_) => StatusCode::NOT_FOUND,
                ProductError::Conflict(_) => StatusCode::CONFLICT,
                ProductError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Order(e) => match e {
                OrderError::Validation(_) | OrderError::InsufficientStock(_) => {
                    StatusCode::BAD_REQUEST
                }
                OrderError::OrderNotFound(_)
                | OrderError::CustomerNotFound(_)
                | OrderError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                OrderError::InvalidTransition { .. } | OrderError::Conflict(_) => {
                    StatusCode::CONFLICT
                }
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Client-facing message. Internal details are never exposed.
    fn detail(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Auth(e) => e.to_string(),
            Self::Customer(e) => e.to_string(),
            Self::Product(e) => e.to_string(),
            Self::Order(e) => e.to_string(),
            Self::Unauthorized(msg) | Self::Forbidden(msg) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(json!({ "detail": self.detail() }));
        (self.status(), body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use lu_estilo_core::{OrderId, OrderStatus, ProductId};

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_order_error_status_codes() {
        assert_eq!(
            status_of(AppError::Order(OrderError::OrderNotFound(OrderId::new(1)))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Order(OrderError::InsufficientStock(
                ProductId::new(2)
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Order(OrderError::InvalidTransition {
                from: OrderStatus::Completed,
                to: OrderStatus::Pending,
            })),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            status_of(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = AppError::Internal("connection refused to 10.0.0.3".to_string());
        assert_eq!(err.detail(), "Internal server error");
    }
}
