//! Business logic services.
//!
//! Services validate payloads, coordinate repositories, and own the
//! transaction boundaries; HTTP routes stay thin.

pub mod auth;
pub mod customers;
pub mod orders;
pub mod products;
pub mod whatsapp;

pub use auth::{AccessClaims, AuthError, AuthService};
pub use customers::{CustomerError, CustomerService};
pub use orders::{OrderError, OrderService};
pub use products::{ProductError, ProductService};
pub use whatsapp::{WhatsappError, WhatsappService};
