//! WhatsApp notification dispatcher backed by the Twilio messaging API.
//!
//! Delivery is best effort: callers fire notifications after their database
//! transaction commits, and a failed send is logged, never propagated. When
//! Twilio credentials are absent the dispatcher runs in simulation mode and
//! logs the message it would have sent.

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use thiserror::Error;

use lu_estilo_core::{OrderId, OrderStatus, Phone};

use crate::config::TwilioConfig;

/// Twilio REST API base URL.
const BASE_URL: &str = "https://api.twilio.com/2010-04-01";

/// Errors that can occur when sending a WhatsApp message.
#[derive(Debug, Error)]
pub enum WhatsappError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Twilio returned an error response.
    #[error("Twilio API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// WhatsApp message client.
///
/// Holds Twilio credentials when configured; otherwise every send is
/// simulated with a log line and reported as delivered.
#[derive(Clone)]
pub struct WhatsappService {
    client: reqwest::Client,
    twilio: Option<TwilioConfig>,
}

impl WhatsappService {
    /// Create a dispatcher. Pass `None` to run in simulation mode.
    #[must_use]
    pub fn new(twilio: Option<TwilioConfig>) -> Self {
        if twilio.is_none() {
            tracing::warn!(
                "Twilio credentials not configured; WhatsApp sends will be simulated"
            );
        }
        Self {
            client: reqwest::Client::new(),
            twilio,
        }
    }

    /// Send a WhatsApp message, or log it when running in simulation mode.
    ///
    /// # Errors
    ///
    /// Returns `WhatsappError` if the Twilio request fails. Callers on the
    /// order lifecycle path log this and move on.
    pub async fn send_message(&self, to: &Phone, body: &str) -> Result<(), WhatsappError> {
        let Some(ref twilio) = self.twilio else {
            tracing::info!(to = %to, body, "simulated WhatsApp send");
            return Ok(());
        };

        let url = format!(
            "{BASE_URL}/Accounts/{}/Messages.json",
            twilio.account_sid
        );
        let params = [
            ("From", format!("whatsapp:{}", twilio.from_number)),
            ("To", format!("whatsapp:{to}")),
            ("Body", body.to_owned()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&twilio.account_sid, Some(twilio.auth_token.expose_secret()))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::CREATED {
            let message = response.text().await.unwrap_or_default();
            return Err(WhatsappError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(to = %to, "WhatsApp message sent");
        Ok(())
    }
}

/// Message sent when an order is first recorded.
#[must_use]
pub fn order_received_message(customer_name: &str, order_id: OrderId) -> String {
    format!(
        "Hello {customer_name}! Your Lu Estilo order #{order_id} has been received \
         and is awaiting processing."
    )
}

/// Message for a status change, or `None` for statuses that are not
/// announced to the customer.
#[must_use]
pub fn status_change_message(
    customer_name: &str,
    order_id: OrderId,
    status: OrderStatus,
) -> Option<String> {
    let line = match status {
        OrderStatus::Pending => return None,
        OrderStatus::Processing => "is now being processed",
        OrderStatus::Completed => "has been completed. Thank you for shopping with us!",
        OrderStatus::Canceled => "has been canceled",
    };
    Some(format!(
        "Hello {customer_name}! Your Lu Estilo order #{order_id} {line}."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_received_message_mentions_order() {
        let msg = order_received_message("Maria", OrderId::new(42));
        assert!(msg.contains("Maria"));
        assert!(msg.contains("#42"));
    }

    #[test]
    fn test_status_messages() {
        let id = OrderId::new(7);
        assert!(status_change_message("Ana", id, OrderStatus::Pending).is_none());
        for status in [
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Canceled,
        ] {
            let msg = status_change_message("Ana", id, status).unwrap();
            assert!(msg.contains("#7"));
        }
    }
}
