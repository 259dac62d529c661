//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (pings the database)
//!
//! # Auth
//! POST /auth/register          - Register a user
//! POST /auth/login             - Login, returns access + refresh tokens
//! POST /auth/refresh           - Rotate a refresh token
//!
//! # Customers (requires auth; DELETE requires admin)
//! GET    /customers            - List customers
//! POST   /customers            - Create customer
//! GET    /customers/{id}       - Get customer
//! PUT    /customers/{id}       - Update customer
//! DELETE /customers/{id}       - Delete customer
//!
//! # Products (requires auth; DELETE requires admin)
//! GET    /products             - List products with catalog filters
//! POST   /products             - Create product
//! GET    /products/{id}        - Get product with image gallery
//! PUT    /products/{id}        - Update product (replaces gallery)
//! DELETE /products/{id}        - Delete product
//!
//! # Orders (requires auth; DELETE requires admin)
//! GET    /orders               - List orders with lifecycle filters
//! POST   /orders               - Create order (reserves stock)
//! GET    /orders/{id}          - Get order with items
//! PUT    /orders/{id}          - Replace customer/status/items
//! PATCH  /orders/{id}/status   - Move the order through its lifecycle
//! DELETE /orders/{id}          - Delete order (restores stock)
//! ```

pub mod auth;
pub mod customers;
pub mod health;
pub mod orders;
pub mod products;

use axum::Router;
use axum::routing::{get, patch, post};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(customers::list).post(customers::create))
        .route(
            "/{id}",
            get(customers::get)
                .put(customers::update)
                .delete(customers::delete),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route(
            "/{id}",
            get(orders::get).put(orders::update).delete(orders::delete),
        )
        .route("/{id}/status", patch(orders::update_status))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/customers", customer_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
}
