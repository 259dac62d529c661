//! Order models, list filters, and response assembly.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use lu_estilo_core::{CustomerId, OrderId, OrderItemId, OrderStatus, ProductId};

use super::product::ProductSummary;

/// Default page size for order listings.
pub const DEFAULT_LIMIT: i64 = 10;
/// Maximum page size for order listings.
pub const MAX_LIMIT: i64 = 100;

/// An order header as persisted.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A persisted line item. `unit_price` is the product price snapshotted when
/// the item was created; it never tracks later catalog changes.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// One requested line in a create/update payload.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Create/full-update payload for an order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderInput {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub status: OrderStatus,
    pub products: Vec<OrderItemInput>,
}

/// Status-transition payload.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateInput {
    pub status: OrderStatus,
}

/// Header fields for a new order, computed by the lifecycle engine.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
}

/// A line item the engine has validated and priced, pending insertion.
#[derive(Debug, Clone)]
pub struct OrderItemDraft {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// An order eagerly loaded with its customer name, line items and product
/// summaries, as returned by the repository.
#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: Order,
    pub customer_name: String,
    pub items: Vec<(OrderItem, ProductSummary)>,
}

/// Raw list query parameters as they arrive on the wire. The lifecycle
/// engine validates these into an [`OrderFilter`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListQuery {
    #[serde(default)]
    pub skip: i64,
    pub limit: Option<i64>,
    pub customer_id: Option<CustomerId>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub order_by: Option<String>,
    pub order_direction: Option<String>,
    pub section: Option<String>,
}

/// Allow-listed sort fields for order listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    TotalAmount,
    Id,
}

impl OrderSortField {
    /// The column this field sorts on. Only values from this closed set are
    /// ever interpolated into SQL.
    #[must_use]
    pub const fn as_column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::TotalAmount => "total_amount",
            Self::Id => "id",
        }
    }

    /// Parse a wire value; unrecognized fields fall back to `created_at`.
    #[must_use]
    pub fn parse_or_default(s: Option<&str>) -> Self {
        match s {
            Some("updated_at") => Self::UpdatedAt,
            Some("total_amount") => Self::TotalAmount,
            Some("id") => Self::Id,
            _ => Self::CreatedAt,
        }
    }
}

/// Sort direction for order listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parse a wire value; anything but `asc` sorts descending.
    #[must_use]
    pub fn parse_or_default(s: Option<&str>) -> Self {
        match s {
            Some("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }
}

/// Validated order listing filters consumed by the repository.
#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub skip: i64,
    pub limit: i64,
    pub customer_id: Option<CustomerId>,
    pub status: Option<OrderStatus>,
    /// Inclusive lower bound on the creation date.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the creation date (queried as an exclusive
    /// bound on the following day).
    pub end_date: Option<NaiveDate>,
    pub order_by: OrderSortField,
    pub direction: SortDirection,
    pub section: Option<String>,
}

/// One line item in an order response.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemResponse {
    pub product: ProductSummary,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// The order value returned to API callers.
///
/// Built from the persisted order plus its customer; domain entities are
/// never mutated for response shaping.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub products: Vec<OrderItemResponse>,
}

impl From<OrderWithItems> for OrderResponse {
    fn from(loaded: OrderWithItems) -> Self {
        Self {
            id: loaded.order.id,
            customer_id: loaded.order.customer_id,
            customer_name: loaded.customer_name,
            status: loaded.order.status,
            total_amount: loaded.order.total_amount,
            created_at: loaded.order.created_at,
            updated_at: loaded.order.updated_at,
            products: loaded
                .items
                .into_iter()
                .map(|(item, product)| OrderItemResponse {
                    product,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_allow_list() {
        assert_eq!(
            OrderSortField::parse_or_default(Some("total_amount")),
            OrderSortField::TotalAmount
        );
        assert_eq!(
            OrderSortField::parse_or_default(Some("id")),
            OrderSortField::Id
        );
        // Unknown fields never reach the SQL layer
        assert_eq!(
            OrderSortField::parse_or_default(Some("password; DROP TABLE orders")),
            OrderSortField::CreatedAt
        );
        assert_eq!(OrderSortField::parse_or_default(None), OrderSortField::CreatedAt);
    }

    #[test]
    fn test_sort_direction_default_desc() {
        assert_eq!(SortDirection::parse_or_default(Some("asc")), SortDirection::Asc);
        assert_eq!(SortDirection::parse_or_default(Some("desc")), SortDirection::Desc);
        assert_eq!(SortDirection::parse_or_default(Some("sideways")), SortDirection::Desc);
        assert_eq!(SortDirection::parse_or_default(None), SortDirection::Desc);
    }

    #[test]
    fn test_response_assembly_preserves_item_order() {
        use chrono::Utc;
        use rust_decimal::Decimal;

        let order = Order {
            id: OrderId::new(1),
            customer_id: CustomerId::new(2),
            status: OrderStatus::Pending,
            total_amount: Decimal::new(1500, 2),
            created_at: Utc::now(),
            updated_at: None,
        };
        let summary = |id: i32| ProductSummary {
            id: ProductId::new(id),
            description: format!("product {id}"),
            price: Decimal::new(500, 2),
            barcode: format!("bar{id}"),
            section: "Shoes".to_owned(),
        };
        let item = |id: i32, product_id: i32, qty: i32| OrderItem {
            id: OrderItemId::new(id),
            order_id: OrderId::new(1),
            product_id: ProductId::new(product_id),
            quantity: qty,
            unit_price: Decimal::new(500, 2),
        };

        let loaded = OrderWithItems {
            order,
            customer_name: "Maria".to_owned(),
            items: vec![(item(1, 10, 2), summary(10)), (item(2, 11, 1), summary(11))],
        };

        let response = OrderResponse::from(loaded);
        assert_eq!(response.customer_name, "Maria");
        assert_eq!(response.products.len(), 2);
        assert_eq!(response.products[0].product.id, ProductId::new(10));
        assert_eq!(response.products[0].quantity, 2);
        assert_eq!(response.products[1].product.id, ProductId::new(11));
    }
}
