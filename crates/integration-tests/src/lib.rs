//! Integration tests for the Lu Estilo API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL and the server
//! cargo run -p lu-estilo-server
//!
//! # Run integration tests against it
//! cargo test -p lu-estilo-integration-tests -- --ignored
//! ```
//!
//! The server URL defaults to `http://localhost:8000` and can be overridden
//! with `API_BASE_URL`.

use reqwest::Client;
use serde_json::{Value, json};

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// Register a throwaway user and return a bearer token for it.
///
/// # Panics
///
/// Panics when the server is unreachable or rejects the registration.
pub async fn register_and_login(client: &Client) -> String {
    let base_url = base_url();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let username = format!("it-user-{suffix}");
    let email = format!("{username}@example.com");
    let password = "integration-test-pw";

    let resp = client
        .post(format!("{base_url}/auth/register"))
        .json(&json!({
            "username": username,
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .expect("Failed to register test user");
    assert!(resp.status().is_success(), "registration failed");

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to login test user");
    assert!(resp.status().is_success(), "login failed");

    let body: Value = resp.json().await.expect("login response was not JSON");
    body["access_token"]
        .as_str()
        .expect("login response missing access_token")
        .to_owned()
}
