//! Customer directory routes. All require authentication; deletion is
//! admin-only.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use lu_estilo_core::CustomerId;

use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::customer::{Customer, CustomerInput};
use crate::services::customers::CustomerService;
use crate::state::AppState;

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    pub limit: Option<i64>,
    pub order_by: Option<String>,
}

/// List customers.
///
/// GET /customers
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Customer>>> {
    let customers = CustomerService::new(state.pool())
        .list(query.order_by.as_deref(), query.skip, query.limit)
        .await?;
    Ok(Json(customers))
}

/// Get a customer by ID.
///
/// GET /customers/{id}
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<CustomerId>,
) -> Result<Json<Customer>> {
    let customer = CustomerService::new(state.pool()).get(id).await?;
    Ok(Json(customer))
}

/// Create a customer.
///
/// POST /customers
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Json(input): Json<CustomerInput>,
) -> Result<(StatusCode, Json<Customer>)> {
    let customer = CustomerService::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Update a customer.
///
/// PUT /customers/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<CustomerId>,
    Json(input): Json<CustomerInput>,
) -> Result<Json<Customer>> {
    let customer = CustomerService::new(state.pool()).update(id, &input).await?;
    Ok(Json(customer))
}

/// Delete a customer. Admin only.
///
/// DELETE /customers/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<CustomerId>,
) -> Result<StatusCode> {
    CustomerService::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
