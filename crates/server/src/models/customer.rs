//! Customer directory models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lu_estilo_core::{Cpf, CustomerId, Email, Phone};

/// A customer on record.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: Email,
    pub cpf: Cpf,
    /// Notification contact, E.164. Orders for customers without a phone
    /// simply skip WhatsApp dispatch.
    pub phone: Option<Phone>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw create/update payload; field validation happens in the service.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerInput {
    pub name: String,
    pub email: String,
    pub cpf: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A validated customer payload, ready for persistence.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: Email,
    pub cpf: Cpf,
    pub phone: Option<Phone>,
}
