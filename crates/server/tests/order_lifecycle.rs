//! Database-backed tests for the order lifecycle engine.
//!
//! Each test runs against a fresh database provisioned by `sqlx::test`
//! with the crate's migrations applied. They are ignored by default so the
//! suite passes without a `PostgreSQL` instance; run them with
//! `cargo test -- --ignored` and `DATABASE_URL` set.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use sqlx::PgPool;

use lu_estilo_core::{CustomerId, OrderId, OrderStatus, ProductId};
use lu_estilo_server::db::customers::CustomerRepository;
use lu_estilo_server::db::products::ProductRepository;
use lu_estilo_server::models::customer::CustomerInput;
use lu_estilo_server::models::order::{OrderInput, OrderItemInput, OrderListQuery};
use lu_estilo_server::models::product::ProductInput;
use lu_estilo_server::services::orders::{OrderError, OrderService};
use lu_estilo_server::services::customers::CustomerService;
use lu_estilo_server::services::whatsapp::WhatsappService;

async fn seed_customer(pool: &PgPool) -> lu_estilo_core::CustomerId {
    let input = CustomerInput {
        name: "Maria Silva".to_owned(),
        email: "maria@example.com".to_owned(),
        cpf: "529.982.247-25".to_owned(),
        phone: None,
    };
    CustomerService::new(pool).create(&input).await.unwrap().id
}

async fn seed_product(pool: &PgPool, barcode: &str, price_cents: i64, stock: i32) -> ProductId {
    let input = ProductInput {
        description: format!("product {barcode}"),
        price: Decimal::new(price_cents, 2),
        barcode: barcode.to_owned(),
        section: "Shirts".to_owned(),
        stock,
        expiry_date: None,
        images: Vec::new(),
    };
    ProductRepository::new(pool).create(&input).await.unwrap().id
}

async fn stock_of(pool: &PgPool, id: ProductId) -> i32 {
    ProductRepository::new(pool)
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap()
        .stock
}

fn order_input(
    customer_id: lu_estilo_core::CustomerId,
    items: Vec<(ProductId, i32)>,
) -> OrderInput {
    OrderInput {
        customer_id,
        status: OrderStatus::Pending,
        products: items
            .into_iter()
            .map(|(product_id, quantity)| OrderItemInput {
                product_id,
                quantity,
            })
            .collect(),
    }
}

fn whatsapp() -> WhatsappService {
    WhatsappService::new(None)
}

#[ignore = "Requires PostgreSQL"]
#[sqlx::test(migrations = "./migrations")]
async fn create_order_snapshots_prices_and_decrements_stock(pool: PgPool) {
    let customer_id = seed_customer(&pool).await;
    let shirt = seed_product(&pool, "1000000000001", 5000, 10).await;
    let shoes = seed_product(&pool, "1000000000002", 12000, 4).await;

    let whatsapp = whatsapp();
    let engine = OrderService::new(&pool, &whatsapp);
    let order = engine
        .create(&order_input(customer_id, vec![(shirt, 2), (shoes, 1)]))
        .await
        .unwrap();

    assert_eq!(order.order.status, OrderStatus::Pending);
    assert_eq!(order.order.total_amount, Decimal::new(22000, 2));
    assert_eq!(order.customer_name, "Maria Silva");
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].0.unit_price, Decimal::new(5000, 2));

    assert_eq!(stock_of(&pool, shirt).await, 8);
    assert_eq!(stock_of(&pool, shoes).await, 3);
}

#[ignore = "Requires PostgreSQL"]
#[sqlx::test(migrations = "./migrations")]
async fn insufficient_stock_rolls_back_the_whole_order(pool: PgPool) {
    let customer_id = seed_customer(&pool).await;
    let plenty = seed_product(&pool, "2000000000001", 5000, 10).await;
    let scarce = seed_product(&pool, "2000000000002", 5000, 1).await;

    let whatsapp = whatsapp();
    let engine = OrderService::new(&pool, &whatsapp);
    let err = engine
        .create(&order_input(customer_id, vec![(plenty, 3), (scarce, 2)]))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::InsufficientStock(id) if id == scarce));

    // The first item's decrement must have been rolled back with the rest.
    assert_eq!(stock_of(&pool, plenty).await, 10);
    assert_eq!(stock_of(&pool, scarce).await, 1);

    let orders = engine.list(&OrderListQuery::default()).await.unwrap();
    assert!(orders.is_empty());
}

#[ignore = "Requires PostgreSQL"]
#[sqlx::test(migrations = "./migrations")]
async fn concurrent_orders_cannot_oversell(pool: PgPool) {
    let customer_id = seed_customer(&pool).await;
    // Stock for one order of two units, not both.
    let product = seed_product(&pool, "9000000000001", 5000, 3).await;

    let whatsapp = whatsapp();
    let engine = OrderService::new(&pool, &whatsapp);
    let first_input = order_input(customer_id, vec![(product, 2)]);
    let second_input = order_input(customer_id, vec![(product, 2)]);
    let first = engine.create(&first_input);
    let second = engine.create(&second_input);
    let (first, second) = tokio::join!(first, second);

    // The row lock serializes the sufficiency checks: exactly one order
    // lands, the loser sees InsufficientStock, and stock never goes
    // negative.
    let failed = match (first, second) {
        (Ok(_), Err(e)) | (Err(e), Ok(_)) => e,
        (Ok(_), Ok(_)) => panic!("both concurrent orders succeeded"),
        (Err(a), Err(b)) => panic!("both concurrent orders failed: {a}; {b}"),
    };
    assert!(matches!(failed, OrderError::InsufficientStock(id) if id == product));
    assert_eq!(stock_of(&pool, product).await, 1);

    let orders = engine.list(&OrderListQuery::default()).await.unwrap();
    assert_eq!(orders.len(), 1);
}

#[ignore = "Requires PostgreSQL"]
#[sqlx::test(migrations = "./migrations")]
async fn update_reports_missing_order_before_missing_customer(pool: PgPool) {
    let whatsapp = whatsapp();
    let engine = OrderService::new(&pool, &whatsapp);

    // Neither the order nor the customer exists; the order lookup wins.
    let err = engine
        .update(
            OrderId::new(4242),
            &order_input(CustomerId::new(4242), vec![(ProductId::new(1), 1)]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::OrderNotFound(id) if id == OrderId::new(4242)));
}

#[ignore = "Requires PostgreSQL"]
#[sqlx::test(migrations = "./migrations")]
async fn cancel_restores_stock_and_is_terminal(pool: PgPool) {
    let customer_id = seed_customer(&pool).await;
    let product = seed_product(&pool, "3000000000001", 5000, 5).await;

    let whatsapp = whatsapp();
    let engine = OrderService::new(&pool, &whatsapp);
    let order = engine
        .create(&order_input(customer_id, vec![(product, 3)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&pool, product).await, 2);

    let canceled = engine
        .update_status(order.order.id, OrderStatus::Canceled)
        .await
        .unwrap();
    assert_eq!(canceled.order.status, OrderStatus::Canceled);
    assert_eq!(stock_of(&pool, product).await, 5);

    // Re-asserting the current status is a no-op, not a second restore.
    engine
        .update_status(order.order.id, OrderStatus::Canceled)
        .await
        .unwrap();
    assert_eq!(stock_of(&pool, product).await, 5);

    // Terminal: no way forward.
    let err = engine
        .update_status(order.order.id, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    // Deleting a canceled order must not restore stock again.
    engine.delete(order.order.id).await.unwrap();
    assert_eq!(stock_of(&pool, product).await, 5);
}

#[ignore = "Requires PostgreSQL"]
#[sqlx::test(migrations = "./migrations")]
async fn status_machine_rejects_skips_and_regressions(pool: PgPool) {
    let customer_id = seed_customer(&pool).await;
    let product = seed_product(&pool, "4000000000001", 5000, 5).await;

    let whatsapp = whatsapp();
    let engine = OrderService::new(&pool, &whatsapp);
    let order = engine
        .create(&order_input(customer_id, vec![(product, 1)]))
        .await
        .unwrap();
    let id = order.order.id;

    // pending cannot jump straight to completed
    let err = engine
        .update_status(id, OrderStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    engine
        .update_status(id, OrderStatus::Processing)
        .await
        .unwrap();
    let err = engine
        .update_status(id, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    let done = engine
        .update_status(id, OrderStatus::Completed)
        .await
        .unwrap();
    assert_eq!(done.order.status, OrderStatus::Completed);

    // Completed is terminal; stock stays reserved.
    let err = engine
        .update_status(id, OrderStatus::Canceled)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
    assert_eq!(stock_of(&pool, product).await, 4);
}

#[ignore = "Requires PostgreSQL"]
#[sqlx::test(migrations = "./migrations")]
async fn update_reconciles_stock_against_replaced_items(pool: PgPool) {
    let customer_id = seed_customer(&pool).await;
    let shirt = seed_product(&pool, "5000000000001", 5000, 10).await;
    let shoes = seed_product(&pool, "5000000000002", 10000, 6).await;

    let whatsapp = whatsapp();
    let engine = OrderService::new(&pool, &whatsapp);
    let order = engine
        .create(&order_input(customer_id, vec![(shirt, 4)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&pool, shirt).await, 6);

    // Replace the shirt line with fewer shirts plus shoes.
    let updated = engine
        .update(
            order.order.id,
            &order_input(customer_id, vec![(shirt, 1), (shoes, 2)]),
        )
        .await
        .unwrap();

    assert_eq!(stock_of(&pool, shirt).await, 9);
    assert_eq!(stock_of(&pool, shoes).await, 4);
    assert_eq!(updated.order.total_amount, Decimal::new(25000, 2));
    assert_eq!(updated.items.len(), 2);
    assert!(updated.order.updated_at.is_some());
}

#[ignore = "Requires PostgreSQL"]
#[sqlx::test(migrations = "./migrations")]
async fn delete_restores_stock_for_live_orders(pool: PgPool) {
    let customer_id = seed_customer(&pool).await;
    let product = seed_product(&pool, "6000000000001", 5000, 5).await;

    let whatsapp = whatsapp();
    let engine = OrderService::new(&pool, &whatsapp);
    let order = engine
        .create(&order_input(customer_id, vec![(product, 2)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&pool, product).await, 3);

    engine.delete(order.order.id).await.unwrap();
    assert_eq!(stock_of(&pool, product).await, 5);

    let err = engine.get(order.order.id).await.unwrap_err();
    assert!(matches!(err, OrderError::OrderNotFound(_)));
}

#[ignore = "Requires PostgreSQL"]
#[sqlx::test(migrations = "./migrations")]
async fn section_filter_returns_each_order_once(pool: PgPool) {
    let customer_id = seed_customer(&pool).await;

    // Two products in the same section; an order containing both must not
    // be duplicated by the section filter.
    let first = seed_product(&pool, "7000000000001", 5000, 10).await;
    let second = seed_product(&pool, "7000000000002", 6000, 10).await;

    let whatsapp = whatsapp();
    let engine = OrderService::new(&pool, &whatsapp);
    let order = engine
        .create(&order_input(customer_id, vec![(first, 1), (second, 1)]))
        .await
        .unwrap();

    let query = OrderListQuery {
        section: Some("Shirts".to_owned()),
        ..OrderListQuery::default()
    };
    let listed = engine.list(&query).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].order.id, order.order.id);
    assert_eq!(listed[0].items.len(), 2);

    let none = engine
        .list(&OrderListQuery {
            section: Some("Hats".to_owned()),
            ..OrderListQuery::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[ignore = "Requires PostgreSQL"]
#[sqlx::test(migrations = "./migrations")]
async fn customer_with_open_orders_cannot_be_deleted(pool: PgPool) {
    let customer_id = seed_customer(&pool).await;
    let product = seed_product(&pool, "8000000000001", 5000, 5).await;

    let whatsapp = whatsapp();
    let engine = OrderService::new(&pool, &whatsapp);
    engine
        .create(&order_input(customer_id, vec![(product, 1)]))
        .await
        .unwrap();

    let err = CustomerRepository::new(&pool)
        .delete(customer_id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        lu_estilo_server::db::RepositoryError::Conflict(_)
    ));
}
