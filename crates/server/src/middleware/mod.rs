//! HTTP middleware and request extractors.

pub mod auth;

pub use auth::{AuthRejection, CurrentUser, RequireAdmin, RequireAuth};
