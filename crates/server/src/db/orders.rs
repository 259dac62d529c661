//! Order repository for database operations.
//!
//! Mutating operations take the engine's open transaction (`PgConnection`)
//! so the header write, line items, and stock adjustments commit or roll
//! back as one unit. Read operations run against the pool and return orders
//! eagerly loaded with customer name, line items and product summaries.

use std::collections::HashMap;

use chrono::{DateTime, Days, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use lu_estilo_core::{CustomerId, OrderId, OrderItemId, OrderStatus, ProductId};

use super::RepositoryError;
use crate::models::order::{NewOrder, Order, OrderFilter, OrderItem, OrderItemDraft, OrderWithItems};
use crate::models::product::ProductSummary;

/// Internal row type for order headers joined with the customer name.
#[derive(Debug, sqlx::FromRow)]
struct OrderHeaderRow {
    id: OrderId,
    customer_id: CustomerId,
    status: OrderStatus,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    customer_name: String,
}

impl OrderHeaderRow {
    fn split(self) -> (Order, String) {
        (
            Order {
                id: self.id,
                customer_id: self.customer_id,
                status: self.status,
                total_amount: self.total_amount,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            self.customer_name,
        )
    }
}

/// Internal row type for line items joined with product summary fields.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    unit_price: Decimal,
    description: String,
    price: Decimal,
    barcode: String,
    section: String,
}

impl ItemRow {
    fn split(self) -> (OrderItem, ProductSummary) {
        (
            OrderItem {
                id: self.id,
                order_id: self.order_id,
                product_id: self.product_id,
                quantity: self.quantity,
                unit_price: self.unit_price,
            },
            ProductSummary {
                id: self.product_id,
                description: self.description,
                price: self.price,
                barcode: self.barcode,
                section: self.section,
            },
        )
    }
}

const HEADER_SELECT: &str = "SELECT o.id, o.customer_id, o.status, o.total_amount, \
     o.created_at, o.updated_at, c.name AS customer_name \
     FROM orders o JOIN customers c ON c.id = o.customer_id";

const ITEM_SELECT: &str = "SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.unit_price, \
     p.description, p.price, p.barcode, p.section \
     FROM order_items oi JOIN products p ON p.id = oi.product_id";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order header and its line items inside the caller's
    /// transaction, returning the generated id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a referential violation.
    pub async fn create(
        conn: &mut PgConnection,
        header: &NewOrder,
        items: &[OrderItemDraft],
    ) -> Result<OrderId, RepositoryError> {
        let (order_id,): (OrderId,) = sqlx::query_as(
            "INSERT INTO orders (customer_id, status, total_amount)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(header.customer_id)
        .bind(header.status)
        .bind(header.total_amount)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "order references a missing customer"))?;

        insert_items(conn, order_id, items).await?;
        Ok(order_id)
    }

    /// Lock and fetch an order header inside the caller's transaction. The
    /// row lock serializes concurrent lifecycle operations on one order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_update(
        conn: &mut PgConnection,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<(OrderId, CustomerId, OrderStatus, Decimal, DateTime<Utc>, Option<DateTime<Utc>>)> =
            sqlx::query_as(
                "SELECT id, customer_id, status, total_amount, created_at, updated_at
                 FROM orders WHERE id = $1 FOR UPDATE",
            )
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.map(
            |(id, customer_id, status, total_amount, created_at, updated_at)| Order {
                id,
                customer_id,
                status,
                total_amount,
                created_at,
                updated_at,
            },
        ))
    }

    /// Fetch an order's line items inside the caller's transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_items(
        conn: &mut PgConnection,
        id: OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows: Vec<(OrderItemId, OrderId, ProductId, i32, Decimal)> = sqlx::query_as(
            "SELECT id, order_id, product_id, quantity, unit_price
             FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, order_id, product_id, quantity, unit_price)| OrderItem {
                id,
                order_id,
                product_id,
                quantity,
                unit_price,
            })
            .collect())
    }

    /// Replace an order's line items and header fields inside the caller's
    /// transaction. The previous item rows are destroyed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a referential violation.
    pub async fn replace_items(
        conn: &mut PgConnection,
        id: OrderId,
        header: &NewOrder,
        items: &[OrderItemDraft],
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            "UPDATE orders
             SET customer_id = $2, status = $3, total_amount = $4, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(header.customer_id)
        .bind(header.status)
        .bind(header.total_amount)
        .execute(&mut *conn)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "order references a missing customer"))?;

        insert_items(conn, id, items).await
    }

    /// Persist a status change inside the caller's transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        conn: &mut PgConnection,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE orders SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Delete an order inside the caller's transaction. Line items cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(conn: &mut PgConnection, id: OrderId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Get an order by ID, eagerly loaded for response assembly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<OrderWithItems>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderHeaderRow>(&format!("{HEADER_SELECT} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, ItemRow>(&format!(
            "{ITEM_SELECT} WHERE oi.order_id = $1 ORDER BY oi.id"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let (order, customer_name) = row.split();
        Ok(Some(OrderWithItems {
            order,
            customer_name,
            items: items.into_iter().map(ItemRow::split).collect(),
        }))
    }

    /// List orders matching `filter`, eagerly loaded.
    ///
    /// The section filter matches orders containing at least one line item
    /// whose product belongs to the section; an `EXISTS` subquery keeps the
    /// result free of duplicate order rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let mut builder = sqlx::QueryBuilder::new(format!("{HEADER_SELECT} WHERE TRUE"));

        if let Some(customer_id) = filter.customer_id {
            builder.push(" AND o.customer_id = ").push_bind(customer_id);
        }
        if let Some(status) = filter.status {
            builder.push(" AND o.status = ").push_bind(status);
        }
        if let Some(start) = filter.start_date {
            builder.push(" AND o.created_at >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            // Inclusive end date: compare against the start of the next day.
            let day_after = end.checked_add_days(Days::new(1)).unwrap_or(end);
            builder.push(" AND o.created_at < ").push_bind(day_after);
        }
        if let Some(ref section) = filter.section {
            builder
                .push(
                    " AND EXISTS (SELECT 1 FROM order_items oi \
                     JOIN products p ON p.id = oi.product_id \
                     WHERE oi.order_id = o.id AND p.section = ",
                )
                .push_bind(section)
                .push(")");
        }

        // Sort field and direction come from closed allow-lists, never from
        // raw user input.
        builder.push(format!(
            " ORDER BY o.{} {}",
            filter.order_by.as_column(),
            filter.direction.as_sql()
        ));
        builder
            .push(" OFFSET ")
            .push_bind(filter.skip)
            .push(" LIMIT ")
            .push_bind(filter.limit);

        let headers: Vec<OrderHeaderRow> = builder.build_query_as().fetch_all(self.pool).await?;
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = headers.iter().map(|h| h.id.as_i32()).collect();
        let item_rows = sqlx::query_as::<_, ItemRow>(&format!(
            "{ITEM_SELECT} WHERE oi.order_id = ANY($1) ORDER BY oi.order_id, oi.id"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut items_by_order: HashMap<OrderId, Vec<(OrderItem, ProductSummary)>> = HashMap::new();
        for row in item_rows {
            items_by_order
                .entry(row.order_id)
                .or_default()
                .push(row.split());
        }

        Ok(headers
            .into_iter()
            .map(|header| {
                let (order, customer_name) = header.split();
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems {
                    order,
                    customer_name,
                    items,
                }
            })
            .collect())
    }
}

/// Insert line items for an order.
async fn insert_items(
    conn: &mut PgConnection,
    order_id: OrderId,
    items: &[OrderItemDraft],
) -> Result<(), RepositoryError> {
    for item in items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, unit_price)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *conn)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "line item references a missing product"))?;
    }
    Ok(())
}
