//! Integration tests for the order lifecycle over HTTP.
//!
//! These tests require a running API server with a `PostgreSQL` database.
//! Run with: `cargo test -p lu-estilo-integration-tests -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

use lu_estilo_core::OrderStatus;
use lu_estilo_integration_tests::{base_url, register_and_login};

/// Valid CPFs for seeding (distinct customers per test run are keyed by
/// email, so reusing a CPF across runs would conflict; generate from a
/// fixed list and a unique email).
const TEST_CPF: &str = "529.982.247-25";

async fn create_customer(client: &Client, token: &str) -> Value {
    let base_url = base_url();
    let suffix = Uuid::new_v4().simple().to_string();
    let resp = client
        .post(format!("{base_url}/customers"))
        .bearer_auth(token)
        .json(&json!({
            "name": "Order Flow Customer",
            "email": format!("order-flow-{suffix}@example.com"),
            "cpf": TEST_CPF,
        }))
        .send()
        .await
        .unwrap();

    // CPF is unique; an earlier run may already own it. Reuse in that case.
    if resp.status() == StatusCode::CONFLICT {
        let resp = client
            .get(format!("{base_url}/customers?order_by=name"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        let customers: Vec<Value> = resp.json().await.unwrap();
        return customers
            .into_iter()
            .find(|c| c["name"] == "Order Flow Customer")
            .expect("conflicting customer not listed");
    }

    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

async fn create_product(client: &Client, token: &str, stock: i32) -> Value {
    let base_url = base_url();
    let suffix = Uuid::new_v4().simple().to_string();
    let resp = client
        .post(format!("{base_url}/products"))
        .bearer_auth(token)
        .json(&json!({
            "description": "Integration test shirt",
            "price": "49.90",
            "barcode": format!("it-{suffix}"),
            "section": "Shirts",
            "stock": stock,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn order_create_and_insufficient_stock() {
    let client = Client::new();
    let base_url = base_url();
    let token = register_and_login(&client).await;

    let customer = create_customer(&client, &token).await;
    let product = create_product(&client, &token, 3).await;

    let resp = client
        .post(format!("{base_url}/orders"))
        .bearer_auth(&token)
        .json(&json!({
            "customer_id": customer["id"],
            "products": [{ "product_id": product["id"], "quantity": 2 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["status"], OrderStatus::Pending.as_str());
    assert_eq!(order["total_amount"], "99.80");
    assert_eq!(order["products"].as_array().unwrap().len(), 1);

    // Only one unit left; asking for two must fail without side effects.
    let resp = client
        .post(format!("{base_url}/orders"))
        .bearer_auth(&token)
        .json(&json!({
            "customer_id": customer["id"],
            "products": [{ "product_id": product["id"], "quantity": 2 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .get(format!("{base_url}/products/{}", product["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let reloaded: Value = resp.json().await.unwrap();
    assert_eq!(reloaded["stock"], 1);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn order_status_walk_and_illegal_transition() {
    let client = Client::new();
    let base_url = base_url();
    let token = register_and_login(&client).await;

    let customer = create_customer(&client, &token).await;
    let product = create_product(&client, &token, 5).await;

    let resp = client
        .post(format!("{base_url}/orders"))
        .bearer_auth(&token)
        .json(&json!({
            "customer_id": customer["id"],
            "products": [{ "product_id": product["id"], "quantity": 1 }],
        }))
        .send()
        .await
        .unwrap();
    let order: Value = resp.json().await.unwrap();
    let order_id = order["id"].clone();

    // pending -> completed skips processing and must be rejected
    let resp = client
        .patch(format!("{base_url}/orders/{order_id}/status"))
        .bearer_auth(&token)
        .json(&json!({ "status": OrderStatus::Completed }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    for status in [OrderStatus::Processing, OrderStatus::Completed] {
        let resp = client
            .patch(format!("{base_url}/orders/{order_id}/status"))
            .bearer_auth(&token)
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], status.as_str());
    }
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn order_delete_requires_admin() {
    let client = Client::new();
    let base_url = base_url();
    let token = register_and_login(&client).await;

    let customer = create_customer(&client, &token).await;
    let product = create_product(&client, &token, 2).await;

    let resp = client
        .post(format!("{base_url}/orders"))
        .bearer_auth(&token)
        .json(&json!({
            "customer_id": customer["id"],
            "products": [{ "product_id": product["id"], "quantity": 1 }],
        }))
        .send()
        .await
        .unwrap();
    let order: Value = resp.json().await.unwrap();

    // Freshly registered users get the plain `user` role.
    let resp = client
        .delete(format!("{base_url}/orders/{}", order["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
