//! Catalog models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use lu_estilo_core::ProductId;

/// A catalog product with its image gallery.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub description: String,
    pub price: Decimal,
    pub barcode: String,
    pub section: String,
    pub stock: i32,
    pub expiry_date: Option<NaiveDate>,
    /// Image URLs in gallery order. Replaced wholesale on every update.
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for a product.
///
/// `images` carries the full gallery: on update the stored set is
/// overwritten, never merged.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub description: String,
    pub price: Decimal,
    pub barcode: String,
    pub section: String,
    pub stock: i32,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Catalog listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    #[serde(default)]
    pub skip: i64,
    pub limit: Option<i64>,
    pub section: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// `true` keeps only in-stock products, `false` only sold-out ones.
    pub available: Option<bool>,
}

/// Product fields embedded in an order line-item response.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub description: String,
    pub price: Decimal,
    pub barcode: String,
    pub section: String,
}
