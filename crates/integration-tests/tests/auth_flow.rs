//! Integration tests for the authentication flow.
//!
//! These tests require a running API server with a `PostgreSQL` database.
//! Run with: `cargo test -p lu-estilo-integration-tests -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

use lu_estilo_integration_tests::base_url;

#[tokio::test]
#[ignore = "Requires running API server"]
async fn register_login_and_refresh_rotates_tokens() {
    let client = Client::new();
    let base_url = base_url();
    let suffix = Uuid::new_v4().simple().to_string();
    let username = format!("auth-{suffix}");

    let resp = client
        .post(format!("{base_url}/auth/register"))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "a-strong-password",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .json(&json!({ "username": username, "password": "a-strong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let pair: Value = resp.json().await.unwrap();
    let refresh_token = pair["refresh_token"].as_str().unwrap().to_owned();

    // First refresh succeeds and issues a new pair.
    let resp = client
        .post(format!("{base_url}/auth/refresh"))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let rotated: Value = resp.json().await.unwrap();
    assert_ne!(rotated["refresh_token"], pair["refresh_token"]);

    // The spent token cannot be redeemed again.
    let resp = client
        .post(format!("{base_url}/auth/refresh"))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn wrong_password_is_rejected() {
    let client = Client::new();
    let base_url = base_url();
    let suffix = Uuid::new_v4().simple().to_string();
    let username = format!("auth-{suffix}");

    client
        .post(format!("{base_url}/auth/register"))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "a-strong-password",
        }))
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .json(&json!({ "username": username, "password": "not-the-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn protected_routes_require_a_token() {
    let client = Client::new();
    let base_url = base_url();

    let resp = client
        .get(format!("{base_url}/customers"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .get(format!("{base_url}/orders"))
        .header("Authorization", "Bearer not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
