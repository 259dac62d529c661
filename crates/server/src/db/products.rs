//! Product repository and stock ledger.
//!
//! Catalog CRUD runs against the pool; the stock ledger operates on the
//! caller's transaction so a failed order leaves no partial decrements
//! behind. The ledger takes a row lock (`SELECT ... FOR UPDATE`) around the
//! check-then-write sequence, so two concurrent orders cannot both pass the
//! sufficiency check and oversell the same product.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use lu_estilo_core::ProductId;

use super::RepositoryError;
use crate::models::product::{Product, ProductFilter, ProductInput};

/// Direction of a stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDirection {
    /// Return quantity to the shelf (cancel, delete, item replacement).
    Increase,
    /// Reserve quantity for an order. Fails when stock is insufficient.
    Decrease,
}

/// Errors from the stock ledger.
#[derive(Debug, Error)]
pub enum StockError {
    /// Negative adjustment requested. Inputs are validated upstream, so this
    /// is defensive.
    #[error("invalid stock adjustment quantity: {0}")]
    InvalidQuantity(i32),

    /// The product id does not resolve.
    #[error("product with ID {0} not found")]
    ProductNotFound(ProductId),

    /// A decrease was requested beyond the current stock level.
    #[error("insufficient stock for product ID {0}")]
    InsufficientStock(ProductId),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Product fields the ledger reports back after an adjustment: enough for
/// the engine to snapshot `unit_price` and observe the new stock level.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductStock {
    pub id: ProductId,
    pub price: Decimal,
    pub stock: i32,
}

/// Atomically adjust a product's stock inside the caller's transaction.
///
/// Locks the product row, verifies sufficiency for decreases, and applies
/// the delta. The non-negative stock invariant holds on return.
///
/// # Errors
///
/// Returns `StockError::InvalidQuantity` if `quantity` is negative,
/// `StockError::ProductNotFound` if the id does not resolve, and
/// `StockError::InsufficientStock` if a decrease exceeds the current level.
pub async fn adjust_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i32,
    direction: StockDirection,
) -> Result<ProductStock, StockError> {
    if quantity < 0 {
        return Err(StockError::InvalidQuantity(quantity));
    }

    // Row lock held until the enclosing transaction commits or rolls back.
    let current = sqlx::query_as::<_, ProductStock>(
        "SELECT id, price, stock FROM products WHERE id = $1 FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StockError::ProductNotFound(product_id))?;

    let new_stock = match direction {
        StockDirection::Increase => current.stock + quantity,
        StockDirection::Decrease => {
            if current.stock < quantity {
                return Err(StockError::InsufficientStock(product_id));
            }
            current.stock - quantity
        }
    };

    sqlx::query("UPDATE products SET stock = $2, updated_at = now() WHERE id = $1")
        .bind(product_id)
        .bind(new_stock)
        .execute(&mut *conn)
        .await?;

    Ok(ProductStock {
        stock: new_stock,
        ..current
    })
}

/// Internal row type for product queries (gallery loaded separately).
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    description: String,
    price: Decimal,
    barcode: String,
    section: String,
    stock: i32,
    expiry_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, images: Vec<String>) -> Product {
        Product {
            id: ProductId::new(self.id),
            description: self.description,
            price: self.price,
            barcode: self.barcode,
            section: self.section,
            stock: self.stock,
            expiry_date: self.expiry_date,
            images,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const COLUMNS: &str = "id, description, price, barcode, section, stock, expiry_date, \
                       created_at, updated_at";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID, with its image gallery.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let images = self.get_images(id).await?;
        Ok(Some(row.into_product(images)))
    }

    /// Get a product by barcode (uniqueness pre-check for create/update).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_barcode(&self, barcode: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS} FROM products WHERE barcode = $1"
        ))
        .bind(barcode)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let images = self.get_images(ProductId::new(row.id)).await?;
        Ok(Some(row.into_product(images)))
    }

    /// List products with catalog filters and pagination.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut builder = sqlx::QueryBuilder::new(format!(
            "SELECT {COLUMNS} FROM products WHERE TRUE"
        ));

        if let Some(ref section) = filter.section {
            builder.push(" AND section = ").push_bind(section);
        }
        if let Some(min_price) = filter.min_price {
            builder.push(" AND price >= ").push_bind(min_price);
        }
        if let Some(max_price) = filter.max_price {
            builder.push(" AND price <= ").push_bind(max_price);
        }
        match filter.available {
            Some(true) => {
                builder.push(" AND stock > 0");
            }
            Some(false) => {
                builder.push(" AND stock = 0");
            }
            None => {}
        }

        builder
            .push(" ORDER BY id OFFSET ")
            .push_bind(filter.skip.max(0))
            .push(" LIMIT ")
            .push_bind(filter.limit.unwrap_or(100).clamp(1, 100));

        let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(self.pool).await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let images = self.get_images(ProductId::new(row.id)).await?;
            products.push(row.into_product(images));
        }
        Ok(products)
    }

    /// Create a product with its image gallery.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the barcode is taken.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (description, price, barcode, section, stock, expiry_date)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        ))
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.barcode)
        .bind(&input.section)
        .bind(input.stock)
        .bind(input.expiry_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "barcode already registered"))?;

        let id = ProductId::new(row.id);
        replace_images(&mut tx, id, &input.images).await?;

        tx.commit().await?;
        Ok(row.into_product(input.images.clone()))
    }

    /// Update a product, overwriting the stored image set with the provided
    /// one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist,
    /// `RepositoryError::Conflict` on a barcode collision.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products
             SET description = $2, price = $3, barcode = $4, section = $5,
                 stock = $6, expiry_date = $7, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.barcode)
        .bind(&input.section)
        .bind(input.stock)
        .bind(input.expiry_date)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "barcode already registered"))?
        .ok_or(RepositoryError::NotFound)?;

        replace_images(&mut tx, id, &input.images).await?;

        tx.commit().await?;
        Ok(row.into_product(input.images.clone()))
    }

    /// Delete a product. Line items referencing it block deletion.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist,
    /// `RepositoryError::Conflict` if order line items still reference it.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx(e, "product is referenced by orders"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get_images(&self, id: ProductId) -> Result<Vec<String>, RepositoryError> {
        let urls: Vec<(String,)> = sqlx::query_as(
            "SELECT url FROM product_images WHERE product_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(urls.into_iter().map(|(url,)| url).collect())
    }
}

/// Overwrite a product's image gallery. Replace-all semantics: the old rows
/// are destroyed, never merged.
async fn replace_images(
    tx: &mut sqlx::PgTransaction<'_>,
    product_id: ProductId,
    images: &[String],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM product_images WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut **tx)
        .await?;

    for (position, url) in images.iter().enumerate() {
        sqlx::query("INSERT INTO product_images (product_id, url, position) VALUES ($1, $2, $3)")
            .bind(product_id)
            .bind(url)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}
