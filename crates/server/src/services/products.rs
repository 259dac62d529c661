//! Product catalog service.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use lu_estilo_core::ProductId;

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;
use crate::models::product::{Product, ProductFilter, ProductInput};

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// A field failed validation.
    #[error("{0}")]
    Validation(String),

    /// Product not found.
    #[error("product with ID {0} not found")]
    NotFound(ProductId),

    /// Barcode already registered, or the product is referenced by orders.
    #[error("{0}")]
    Conflict(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ProductError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Repository(other),
        }
    }
}

/// Product catalog service.
pub struct ProductService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> ProductService<'a> {
    /// Create a new product service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
        }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` if the id does not resolve.
    pub async fn get(&self, id: ProductId) -> Result<Product, ProductError> {
        self.products
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// List products with catalog filters.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Validation` on an inverted price range.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, ProductError> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price)
            && min > max
        {
            return Err(ProductError::Validation(
                "min_price must not exceed max_price".into(),
            ));
        }
        Ok(self.products.list(filter).await?)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Validation` on a malformed field and
    /// `ProductError::Conflict` when the barcode is taken.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, ProductError> {
        validate(input)?;

        if self.products.get_by_barcode(&input.barcode).await?.is_some() {
            return Err(ProductError::Conflict("barcode already registered".into()));
        }

        Ok(self.products.create(input).await?)
    }

    /// Update a product, replacing its image gallery.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` if the id does not resolve,
    /// `ProductError::Conflict` when the barcode belongs to another product.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, ProductError> {
        validate(input)?;

        if let Some(existing) = self.products.get_by_barcode(&input.barcode).await?
            && existing.id != id
        {
            return Err(ProductError::Conflict("barcode already registered".into()));
        }

        self.products.update(id, input).await.map_err(|e| match e {
            RepositoryError::NotFound => ProductError::NotFound(id),
            other => other.into(),
        })
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` if the id does not resolve,
    /// `ProductError::Conflict` when order line items still reference it.
    pub async fn delete(&self, id: ProductId) -> Result<(), ProductError> {
        self.products.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => ProductError::NotFound(id),
            other => other.into(),
        })
    }
}

/// Validate a product payload.
fn validate(input: &ProductInput) -> Result<(), ProductError> {
    if input.description.trim().is_empty() {
        return Err(ProductError::Validation(
            "description must not be empty".into(),
        ));
    }
    if input.barcode.trim().is_empty() {
        return Err(ProductError::Validation("barcode must not be empty".into()));
    }
    if input.section.trim().is_empty() {
        return Err(ProductError::Validation("section must not be empty".into()));
    }
    if input.price <= Decimal::ZERO {
        return Err(ProductError::Validation("price must be positive".into()));
    }
    if input.stock < 0 {
        return Err(ProductError::Validation(
            "stock must not be negative".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ProductInput {
        ProductInput {
            description: "Linen shirt".to_owned(),
            price: Decimal::new(8990, 2),
            barcode: "7891234567895".to_owned(),
            section: "Shirts".to_owned(),
            stock: 12,
            expiry_date: None,
            images: vec!["https://cdn.example.com/shirt.jpg".to_owned()],
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_input() {
        assert!(validate(&input()).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_price() {
        let mut bad = input();
        bad.price = Decimal::ZERO;
        assert!(matches!(validate(&bad), Err(ProductError::Validation(_))));
        bad.price = Decimal::new(-100, 2);
        assert!(matches!(validate(&bad), Err(ProductError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_negative_stock() {
        let mut bad = input();
        bad.stock = -1;
        assert!(matches!(validate(&bad), Err(ProductError::Validation(_))));
    }
}
