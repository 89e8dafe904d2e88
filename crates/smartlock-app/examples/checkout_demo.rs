///  To run :
///  cargo r --example checkout_demo
use std::sync::Arc;

use smartlock_client::{ApiError, StoreClient};
use smartlock_hex::application::admin_guard::AdminGuard;
use smartlock_hex::application::AppState;
use smartlock_hex::inbound::http::{HttpServer, HttpServerConfig};
use smartlock_hex::outbound::DisabledGateway;
use smartlock_repo::build_repo;
use smartlock_repo::seed::seed_default_catalog;
use smartlock_types::api::{CartItemRequest, PlaceOrderRequest};
use smartlock_types::domain::order::OrderStatus;
use tempfile::tempdir;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn checkout(product_id: i64, quantity: i64, reference: &str) -> PlaceOrderRequest {
    PlaceOrderRequest {
        customer_name: "Jan Jansen".into(),
        customer_email: "jan@example.com".into(),
        customer_phone: "06-12345678".into(),
        customer_address: "Hoofdstraat 123".into(),
        customer_city: "Amsterdam".into(),
        customer_postal_code: "1000 AA".into(),
        total_amount: None,
        order_items: vec![CartItemRequest {
            id: product_id,
            quantity,
            price: None,
        }],
        payment_intent_id: Some(reference.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("smartlock.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let repo = build_repo(Some(&db_url)).await?;
    seed_default_catalog(&repo).await?;
    let guard = AdminGuard::new(
        "demo-secret-change-me-please",
        "beheer",
        "geheim",
        std::time::Duration::from_secs(3600),
    )?;
    let server = HttpServer::new(
        AppState::new(repo, Arc::new(DisabledGateway), guard),
        HttpServerConfig {
            port: port.to_string(),
            ..Default::default()
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let client = StoreClient::new(&addr)?;
    for p in client.list_products().await? {
        println!("#{} {} EUR {} ({} in stock)", p.id, p.name, p.price, p.stock);
    }

    let placed = client.place_order(&checkout(1, 2, "pi_demo")).await?;
    println!(
        "Placed order id={} total={} (VAT {})",
        placed.order_id, placed.total_amount, placed.vat_amount
    );

    // A retry after a dropped connection returns the same order.
    let replay = client.place_order(&checkout(1, 2, "pi_demo")).await?;
    assert_eq!(replay.order_id, placed.order_id);
    println!("Replay returned order id={}", replay.order_id);

    match client.place_order(&checkout(3, 500, "pi_too_many")).await {
        Err(err) => match err.downcast_ref::<ApiError>() {
            Some(api) => println!("Refused: {} {:?}", api.status, api.body.shortages),
            None => return Err(err),
        },
        Ok(o) => anyhow::bail!("unexpectedly placed order {}", o.order_id),
    }

    let session = client.login("beheer", "geheim").await?;
    let admin = client.clone().with_token(session.token);
    let updated = admin
        .update_order_status(placed.order_id, OrderStatus::Processing)
        .await?;
    println!("Order {} is now {}", updated.id, updated.status);

    for o in admin.admin_orders().await? {
        println!("Order {} [{}] total={}", o.id, o.status, o.total_amount);
    }

    handle.abort();
    Ok(())
}
