//! Customer directory service.
//!
//! Validates raw payloads into domain values and enforces email/CPF
//! uniqueness with a pre-check, leaving the database constraint as the
//! last line of defense against races.

use sqlx::PgPool;
use thiserror::Error;

use lu_estilo_core::{Cpf, CustomerId, Email, Phone};

use crate::db::RepositoryError;
use crate::db::customers::CustomerRepository;
use crate::models::customer::{Customer, CustomerInput, NewCustomer};

/// Errors that can occur during customer operations.
#[derive(Debug, Error)]
pub enum CustomerError {
    /// A field failed validation.
    #[error("{0}")]
    Validation(String),

    /// Customer not found.
    #[error("customer with ID {0} not found")]
    NotFound(CustomerId),

    /// Email or CPF already registered, or the customer still has orders.
    #[error("{0}")]
    Conflict(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CustomerError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Repository(other),
        }
    }
}

/// Customer directory service.
pub struct CustomerService<'a> {
    customers: CustomerRepository<'a>,
}

impl<'a> CustomerService<'a> {
    /// Create a new customer service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            customers: CustomerRepository::new(pool),
        }
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::NotFound` if the id does not resolve.
    pub async fn get(&self, id: CustomerId) -> Result<Customer, CustomerError> {
        self.customers
            .get_by_id(id)
            .await?
            .ok_or(CustomerError::NotFound(id))
    }

    /// List customers with pagination and optional name/email ordering.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::Repository` if the query fails.
    pub async fn list(
        &self,
        order_by: Option<&str>,
        skip: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Customer>, CustomerError> {
        let limit = limit.unwrap_or(100).clamp(1, 100);
        Ok(self.customers.list(order_by, skip.max(0), limit).await?)
    }

    /// Create a customer.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::Validation` on a malformed field and
    /// `CustomerError::Conflict` when the email or CPF is taken.
    pub async fn create(&self, input: &CustomerInput) -> Result<Customer, CustomerError> {
        let new_customer = validate(input)?;

        if self
            .customers
            .get_by_email(&new_customer.email)
            .await?
            .is_some()
        {
            return Err(CustomerError::Conflict("email already registered".into()));
        }
        if self
            .customers
            .get_by_cpf(&new_customer.cpf)
            .await?
            .is_some()
        {
            return Err(CustomerError::Conflict("CPF already registered".into()));
        }

        Ok(self.customers.create(&new_customer).await?)
    }

    /// Update a customer in place.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::NotFound` if the id does not resolve,
    /// `CustomerError::Conflict` when the new email or CPF belongs to
    /// another customer.
    pub async fn update(
        &self,
        id: CustomerId,
        input: &CustomerInput,
    ) -> Result<Customer, CustomerError> {
        let new_customer = validate(input)?;

        if let Some(existing) = self.customers.get_by_email(&new_customer.email).await?
            && existing.id != id
        {
            return Err(CustomerError::Conflict("email already registered".into()));
        }
        if let Some(existing) = self.customers.get_by_cpf(&new_customer.cpf).await?
            && existing.id != id
        {
            return Err(CustomerError::Conflict("CPF already registered".into()));
        }

        self.customers
            .update(id, &new_customer)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CustomerError::NotFound(id),
                other => other.into(),
            })
    }

    /// Delete a customer.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::NotFound` if the id does not resolve,
    /// `CustomerError::Conflict` when orders still reference the customer.
    pub async fn delete(&self, id: CustomerId) -> Result<(), CustomerError> {
        self.customers.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => CustomerError::NotFound(id),
            other => other.into(),
        })
    }
}

/// Validate a raw payload into domain values.
fn validate(input: &CustomerInput) -> Result<NewCustomer, CustomerError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(CustomerError::Validation("name must not be empty".into()));
    }

    let email = Email::parse(&input.email)
        .map_err(|e| CustomerError::Validation(format!("invalid email: {e}")))?;
    let cpf = Cpf::parse(&input.cpf)
        .map_err(|e| CustomerError::Validation(format!("invalid CPF: {e}")))?;
    let phone = input
        .phone
        .as_deref()
        .map(Phone::parse)
        .transpose()
        .map_err(|e| CustomerError::Validation(format!("invalid phone: {e}")))?;

    Ok(NewCustomer {
        name: name.to_owned(),
        email,
        cpf,
        phone,
    })
}
