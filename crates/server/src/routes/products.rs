//! Product catalog routes. All require authentication; deletion is
//! admin-only.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use lu_estilo_core::ProductId;

use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::product::{Product, ProductFilter, ProductInput};
use crate::services::products::ProductService;
use crate::state::AppState;

/// List products with catalog filters.
///
/// GET /products
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductService::new(state.pool()).list(&filter).await?;
    Ok(Json(products))
}

/// Get a product by ID.
///
/// GET /products/{id}
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductService::new(state.pool()).get(id).await?;
    Ok(Json(product))
}

/// Create a product.
///
/// POST /products
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = ProductService::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product, replacing its image gallery.
///
/// PUT /products/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    let product = ProductService::new(state.pool()).update(id, &input).await?;
    Ok(Json(product))
}

/// Delete a product. Admin only.
///
/// DELETE /products/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductService::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
