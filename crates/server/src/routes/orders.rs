//! Order lifecycle routes. All require authentication; deletion is
//! admin-only.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use lu_estilo_core::OrderId;

use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::order::{OrderInput, OrderListQuery, OrderResponse, StatusUpdateInput};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Create an order, reserving stock for every line item.
///
/// POST /orders
///
/// # Errors
///
/// Returns 404 for an unknown customer or product, 400 when any item's
/// stock is insufficient.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Json(input): Json<OrderInput>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let order = OrderService::new(state.pool(), state.whatsapp())
        .create(&input)
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// List orders with lifecycle filters.
///
/// GET /orders
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<OrderResponse>>> {
    let orders = OrderService::new(state.pool(), state.whatsapp())
        .list(&query)
        .await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// Get an order by ID.
///
/// GET /orders/{id}
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = OrderService::new(state.pool(), state.whatsapp())
        .get(id)
        .await?;
    Ok(Json(order.into()))
}

/// Replace an order's customer, status, and line items.
///
/// PUT /orders/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<OrderId>,
    Json(input): Json<OrderInput>,
) -> Result<Json<OrderResponse>> {
    let order = OrderService::new(state.pool(), state.whatsapp())
        .update(id, &input)
        .await?;
    Ok(Json(order.into()))
}

/// Move an order to a new status.
///
/// PATCH /orders/{id}/status
///
/// # Errors
///
/// Returns 409 on an illegal transition.
pub async fn update_status(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<OrderId>,
    Json(input): Json<StatusUpdateInput>,
) -> Result<Json<OrderResponse>> {
    let order = OrderService::new(state.pool(), state.whatsapp())
        .update_status(id, input.status)
        .await?;
    Ok(Json(order.into()))
}

/// Delete an order, restoring its stock. Admin only.
///
/// DELETE /orders/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<StatusCode> {
    OrderService::new(state.pool(), state.whatsapp())
        .delete(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
