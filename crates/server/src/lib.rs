//! Lu Estilo API server library.
//!
//! A JSON REST backend for the Lu Estilo clothing store: customer
//! directory, product catalog with image galleries, and an order
//! lifecycle engine that keeps orders and the stock ledger consistent.
//!
//! # Architecture
//!
//! - Axum web framework, JSON in and out
//! - `PostgreSQL` via sqlx; one transaction per lifecycle operation
//! - JWT access tokens plus rotated opaque refresh tokens
//! - WhatsApp notifications via Twilio, best effort after commit

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router with its middleware stack.
#[must_use]
pub fn app(state: AppState) -> Router {
    routes::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
