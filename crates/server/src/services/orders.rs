//! Order lifecycle engine.
//!
//! Every mutating operation runs inside a single database transaction that
//! covers the order rows and all stock movements, so an order either lands
//! fully reconciled against the stock ledger or not at all. Reads assemble
//! orders with their customer name, line items, and product summaries.
//!
//! WhatsApp notifications fire only after the transaction commits and are
//! best effort: a delivery failure is logged and never rolls back or fails
//! the operation that triggered it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use lu_estilo_core::{CustomerId, OrderId, OrderStatus, ProductId};

use crate::db::customers::CustomerRepository;
use crate::db::orders::OrderRepository;
use crate::db::products::{StockDirection, StockError, adjust_stock};
use crate::db::RepositoryError;
use crate::models::customer::Customer;
use crate::models::order::{
    DEFAULT_LIMIT, MAX_LIMIT, NewOrder, OrderFilter, OrderInput, OrderItemDraft, OrderItemInput,
    OrderListQuery, OrderSortField, OrderWithItems, SortDirection,
};
use crate::services::whatsapp::{WhatsappService, order_received_message, status_change_message};

/// Errors that can occur during order lifecycle operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A field or filter failed validation.
    #[error("{0}")]
    Validation(String),

    /// Order not found.
    #[error("order with ID {0} not found")]
    OrderNotFound(OrderId),

    /// The referenced customer does not exist.
    #[error("customer with ID {0} not found")]
    CustomerNotFound(CustomerId),

    /// A line item references a product that does not exist.
    #[error("product with ID {0} not found")]
    ProductNotFound(ProductId),

    /// A line item asks for more units than the shelf holds.
    #[error("insufficient stock for product ID {0}")]
    InsufficientStock(ProductId),

    /// The requested status change is not allowed from the current status.
    #[error("cannot change order status from '{from}' to '{to}'")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Constraint violation surfaced by the store.
    #[error("{0}")]
    Conflict(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for OrderError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Repository(other),
        }
    }
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

impl From<StockError> for OrderError {
    fn from(e: StockError) -> Self {
        match e {
            StockError::ProductNotFound(id) => Self::ProductNotFound(id),
            StockError::InsufficientStock(id) => Self::InsufficientStock(id),
            StockError::InvalidQuantity(q) => {
                Self::Validation(format!("invalid item quantity: {q}"))
            }
            StockError::Database(e) => Self::Repository(RepositoryError::Database(e)),
        }
    }
}

/// Order lifecycle engine.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    whatsapp: &'a WhatsappService,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, whatsapp: &'a WhatsappService) -> Self {
        Self { pool, whatsapp }
    }

    /// Create an order, decrementing stock for every line item.
    ///
    /// All stock movements and the order rows commit atomically; if any
    /// item's stock is insufficient, nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::CustomerNotFound`, `OrderError::ProductNotFound`,
    /// `OrderError::InsufficientStock`, or `OrderError::Validation` depending
    /// on what invalidates the payload.
    pub async fn create(&self, input: &OrderInput) -> Result<OrderWithItems, OrderError> {
        validate_items(&input.products)?;
        if input.status == OrderStatus::Canceled {
            return Err(OrderError::Validation(
                "an order cannot be created as canceled".into(),
            ));
        }

        let customer = self.require_customer(input.customer_id).await?;

        let mut tx = self.pool.begin().await?;

        let (drafts, total_amount) = reserve_items(&mut tx, &input.products).await?;

        let header = NewOrder {
            customer_id: customer.id,
            status: input.status,
            total_amount,
        };
        let order_id = OrderRepository::create(&mut tx, &header, &drafts).await?;

        tx.commit().await?;

        let loaded = self.reload(order_id).await?;
        self.notify(&customer, &order_received_message(&customer.name, order_id))
            .await;

        Ok(loaded)
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if the id does not resolve.
    pub async fn get(&self, id: OrderId) -> Result<OrderWithItems, OrderError> {
        OrderRepository::new(self.pool)
            .get_by_id(id)
            .await?
            .ok_or(OrderError::OrderNotFound(id))
    }

    /// List orders matching the raw query parameters.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` on an unparseable status or date, or
    /// an inverted date range.
    pub async fn list(&self, query: &OrderListQuery) -> Result<Vec<OrderWithItems>, OrderError> {
        let filter = parse_list_query(query)?;
        Ok(OrderRepository::new(self.pool).list(&filter).await?)
    }

    /// Replace an order's customer, status, and line items.
    ///
    /// The previous items' stock is returned to the shelf and the new items
    /// are reserved, all inside one transaction; the order total is
    /// recomputed from freshly snapshotted prices.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidTransition` when the order is terminal or
    /// the new status is unreachable, plus the same validation errors as
    /// [`Self::create`]. A full update may not cancel an order; use the
    /// status operation for that.
    pub async fn update(
        &self,
        id: OrderId,
        input: &OrderInput,
    ) -> Result<OrderWithItems, OrderError> {
        validate_items(&input.products)?;
        if input.status == OrderStatus::Canceled {
            return Err(OrderError::Validation(
                "use the status endpoint to cancel an order".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let order = OrderRepository::get_for_update(&mut tx, id)
            .await?
            .ok_or(OrderError::OrderNotFound(id))?;

        // The order must resolve before its would-be customer does.
        self.require_customer(input.customer_id).await?;

        if !order.status.can_transition_to(input.status) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: input.status,
            });
        }

        // Return the old reservation before taking the new one, so an update
        // that reuses a product never competes with its own stock.
        let existing = OrderRepository::get_items(&mut tx, id).await?;
        for item in &existing {
            adjust_stock(&mut tx, item.product_id, item.quantity, StockDirection::Increase)
                .await?;
        }

        let (drafts, total_amount) = reserve_items(&mut tx, &input.products).await?;

        let header = NewOrder {
            customer_id: input.customer_id,
            status: input.status,
            total_amount,
        };
        OrderRepository::replace_items(&mut tx, id, &header, &drafts).await?;

        tx.commit().await?;

        self.reload(id).await
    }

    /// Move an order to a new status.
    ///
    /// A transition to `canceled` returns every line item's stock to the
    /// shelf in the same transaction. Re-asserting the current status is an
    /// idempotent no-op. Customers are notified of processing, completion,
    /// and cancellation after commit.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` or `OrderError::InvalidTransition`.
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<OrderWithItems, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order = OrderRepository::get_for_update(&mut tx, id)
            .await?
            .ok_or(OrderError::OrderNotFound(id))?;

        if order.status == next {
            tx.commit().await?;
            return self.reload(id).await;
        }

        if !order.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        if next == OrderStatus::Canceled {
            let items = OrderRepository::get_items(&mut tx, id).await?;
            for item in &items {
                self.restore_item_stock(&mut tx, item.product_id, item.quantity)
                    .await?;
            }
        }

        OrderRepository::update_status(&mut tx, id, next).await?;
        tx.commit().await?;

        let loaded = self.reload(id).await?;
        if let Ok(customer) = self.require_customer(loaded.order.customer_id).await
            && let Some(message) = status_change_message(&customer.name, id, next)
        {
            self.notify(&customer, &message).await;
        }

        Ok(loaded)
    }

    /// Delete an order, returning its stock to the shelf unless the order
    /// was already canceled (cancellation restored it).
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if the id does not resolve.
    pub async fn delete(&self, id: OrderId) -> Result<(), OrderError> {
        let mut tx = self.pool.begin().await?;

        let order = OrderRepository::get_for_update(&mut tx, id)
            .await?
            .ok_or(OrderError::OrderNotFound(id))?;

        if order.status != OrderStatus::Canceled {
            let items = OrderRepository::get_items(&mut tx, id).await?;
            for item in &items {
                self.restore_item_stock(&mut tx, item.product_id, item.quantity)
                    .await?;
            }
        }

        OrderRepository::delete(&mut tx, id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Restore stock for one line item, tolerating products deleted since
    /// the order was placed.
    async fn restore_item_stock(
        &self,
        conn: &mut sqlx::PgConnection,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), OrderError> {
        match adjust_stock(conn, product_id, quantity, StockDirection::Increase).await {
            Ok(_) => Ok(()),
            Err(StockError::ProductNotFound(id)) => {
                tracing::warn!(product_id = %id, "skipping stock restore for deleted product");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn require_customer(&self, id: CustomerId) -> Result<Customer, OrderError> {
        CustomerRepository::new(self.pool)
            .get_by_id(id)
            .await?
            .ok_or(OrderError::CustomerNotFound(id))
    }

    async fn reload(&self, id: OrderId) -> Result<OrderWithItems, OrderError> {
        OrderRepository::new(self.pool)
            .get_by_id(id)
            .await?
            .ok_or(OrderError::OrderNotFound(id))
    }

    /// Fire a WhatsApp notification if the customer has a phone on record.
    /// Failures are logged, never propagated.
    async fn notify(&self, customer: &Customer, message: &str) {
        let Some(ref phone) = customer.phone else {
            return;
        };
        if let Err(e) = self.whatsapp.send_message(phone, message).await {
            tracing::error!(customer_id = %customer.id, error = %e, "WhatsApp dispatch failed");
        }
    }
}

/// Lock, check, and decrement stock for each requested line, snapshotting
/// the current catalog price into the draft and accumulating the total.
async fn reserve_items(
    conn: &mut sqlx::PgConnection,
    items: &[OrderItemInput],
) -> Result<(Vec<OrderItemDraft>, Decimal), OrderError> {
    let mut drafts = Vec::with_capacity(items.len());
    let mut total = Decimal::ZERO;

    for item in items {
        let product =
            adjust_stock(conn, item.product_id, item.quantity, StockDirection::Decrease).await?;

        total += product.price * Decimal::from(item.quantity);
        drafts.push(OrderItemDraft {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: product.price,
        });
    }

    Ok((drafts, total))
}

/// Validate the line items of a create/update payload.
fn validate_items(items: &[OrderItemInput]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::Validation(
            "order must contain at least one product".into(),
        ));
    }
    for item in items {
        if item.quantity <= 0 {
            return Err(OrderError::Validation(format!(
                "quantity for product ID {} must be positive",
                item.product_id
            )));
        }
    }
    Ok(())
}

/// Validate raw list query parameters into a repository filter.
fn parse_list_query(query: &OrderListQuery) -> Result<OrderFilter, OrderError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse::<OrderStatus>()
                .map_err(|_| OrderError::Validation(format!("invalid order status filter: {s}")))
        })
        .transpose()?;

    let start_date = parse_date(query.start_date.as_deref(), "start_date")?;
    let end_date = parse_date(query.end_date.as_deref(), "end_date")?;
    if let (Some(start), Some(end)) = (start_date, end_date)
        && start > end
    {
        return Err(OrderError::Validation(
            "start_date must not be after end_date".into(),
        ));
    }

    Ok(OrderFilter {
        skip: query.skip.max(0),
        limit: query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        customer_id: query.customer_id,
        status,
        start_date,
        end_date,
        order_by: OrderSortField::parse_or_default(query.order_by.as_deref()),
        direction: SortDirection::parse_or_default(query.order_direction.as_deref()),
        section: query.section.clone(),
    })
}

/// Parse an ISO `YYYY-MM-DD` date parameter.
fn parse_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, OrderError> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| OrderError::Validation(format!("invalid {field}: {s}")))
        })
        .transpose()
}
