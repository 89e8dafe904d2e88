//! Behaviour every storage backend must share. Each backend's test file runs
//! these against a fresh store.

#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use smartlock_types::domain::contact::{MessageStatus, NewMessage};
use smartlock_types::domain::customer::Customer;
use smartlock_types::domain::order::{NewOrder, OrderStatus};
use smartlock_types::domain::product::{NewProduct, ProductCategory};
use smartlock_types::domain::stock::{ReservedLine, StockReservation};
use smartlock_types::domain::visit::NewVisit;
use smartlock_types::ports::{RepoError, ReservationError, StoreRepository};
use std::sync::Arc;

pub fn product(name: &str, cents: i64, stock: u32) -> NewProduct {
    NewProduct {
        name: name.into(),
        description: format!("{name} omschrijving"),
        price: Decimal::new(cents, 2),
        image: "/images/test.png".into(),
        category: ProductCategory::Fietsslot,
        stock,
        features: vec!["Bluetooth".into()],
    }
}

pub fn customer() -> Customer {
    Customer {
        name: "Test".into(),
        email: "test@example.com".into(),
        phone: "0612345678".into(),
        address: "Teststraat 1".into(),
        city: "Utrecht".into(),
        postal_code: "3511 AA".into(),
    }
}

pub fn new_order(reference: Option<&str>) -> NewOrder {
    NewOrder::new(
        customer(),
        vec![ReservedLine {
            product_id: 1,
            product_name: "Widget".into(),
            quantity: 2,
            unit_price: Decimal::new(500, 2),
        }],
        reference.map(str::to_string),
    )
    .unwrap()
}

fn reserve(id: i64, quantity: u32) -> StockReservation {
    StockReservation {
        product_id: id,
        quantity,
    }
}

pub async fn catalog_crud_flow<R: StoreRepository>(repo: &R) {
    let a = repo.create_product(product("A", 8999, 5)).await.unwrap();
    let b = repo.create_product(product("B", 7999, 1)).await.unwrap();
    assert!(b.id > a.id);

    let fetched = repo.get_product(a.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "A");
    assert_eq!(fetched.price, Decimal::new(8999, 2));
    assert_eq!(fetched.features, vec!["Bluetooth".to_string()]);

    let ids: Vec<i64> = repo
        .list_products()
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![a.id, b.id]);

    let updated = repo
        .update_product(a.id, product("A2", 9999, 40))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.stock, 40);
    assert_eq!(updated.name, "A2");
    assert_eq!(updated.created_at, fetched.created_at);

    assert!(repo.delete_product(b.id).await.unwrap());
    assert!(!repo.delete_product(b.id).await.unwrap());
    assert!(repo.get_product(b.id).await.unwrap().is_none());
    assert!(repo
        .update_product(b.id, product("B", 1, 1))
        .await
        .unwrap()
        .is_none());
}

pub async fn reservation_decrements_stock<R: StoreRepository>(repo: &R) {
    let a = repo.create_product(product("A", 8999, 5)).await.unwrap();

    let lines = repo.reserve(&[reserve(a.id, 3)]).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].product_name, "A");
    assert_eq!(lines[0].unit_price, Decimal::new(8999, 2));
    assert_eq!(repo.get_product(a.id).await.unwrap().unwrap().stock, 2);

    repo.release(&[reserve(a.id, 3)]).await.unwrap();
    assert_eq!(repo.get_product(a.id).await.unwrap().unwrap().stock, 5);
}

pub async fn reservation_is_all_or_nothing<R: StoreRepository>(repo: &R) {
    let a = repo.create_product(product("A", 100, 2)).await.unwrap();
    let b = repo.create_product(product("B", 100, 1)).await.unwrap();

    // B is listed first so its decrement is applied before A fails.
    let err = repo
        .reserve(&[reserve(b.id, 1), reserve(a.id, 3)])
        .await
        .unwrap_err();
    match err {
        ReservationError::Insufficient(shortages) => {
            assert_eq!(shortages.len(), 1);
            assert_eq!(shortages[0].product_id, a.id);
            assert_eq!(shortages[0].requested, 3);
            assert_eq!(shortages[0].available, Some(2));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(repo.get_product(a.id).await.unwrap().unwrap().stock, 2);
    assert_eq!(repo.get_product(b.id).await.unwrap().unwrap().stock, 1);
}

pub async fn reservation_of_deleted_product_fails<R: StoreRepository>(repo: &R) {
    let a = repo.create_product(product("A", 100, 4)).await.unwrap();
    let gone = repo.create_product(product("Gone", 100, 4)).await.unwrap();
    repo.delete_product(gone.id).await.unwrap();

    let err = repo
        .reserve(&[reserve(a.id, 1), reserve(gone.id, 1)])
        .await
        .unwrap_err();
    match err {
        ReservationError::Insufficient(shortages) => {
            assert_eq!(shortages[0].product_id, gone.id);
            assert_eq!(shortages[0].available, None);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(repo.get_product(a.id).await.unwrap().unwrap().stock, 4);

    // Releasing against a deleted product is a no-op, not an error.
    repo.release(&[reserve(gone.id, 1)]).await.unwrap();
}

pub async fn concurrent_reservations_never_oversell<R: StoreRepository>(repo: Arc<R>) {
    let id = repo.create_product(product("A", 100, 5)).await.unwrap().id;

    let mut handles = Vec::new();
    for _ in 0..12 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.reserve(&[reserve(id, 1)]).await.is_ok()
        }));
    }
    let mut granted = 0;
    for h in handles {
        if h.await.unwrap() {
            granted += 1;
        }
    }
    assert_eq!(granted, 5);
    assert_eq!(repo.get_product(id).await.unwrap().unwrap().stock, 0);
}

pub async fn order_flow<R: StoreRepository>(repo: &R) {
    let first = repo.create_order(new_order(Some("pi_1"))).await.unwrap();
    let second = repo.create_order(new_order(None)).await.unwrap();
    assert!(second.id > first.id);
    assert_eq!(first.status, OrderStatus::Pending);
    assert_eq!(first.total_amount, Decimal::new(1000, 2));

    let fetched = repo.get_order(first.id).await.unwrap().unwrap();
    assert_eq!(fetched.customer.city, "Utrecht");
    assert_eq!(fetched.order_items[0].product_name, "Widget");

    let by_ref = repo
        .find_by_payment_reference("pi_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_ref.id, first.id);
    assert!(repo
        .find_by_payment_reference("pi_unknown")
        .await
        .unwrap()
        .is_none());

    let listed: Vec<i64> = repo
        .list_orders()
        .await
        .unwrap()
        .iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(listed, vec![second.id, first.id]);
}

pub async fn duplicate_payment_reference_is_rejected<R: StoreRepository>(repo: &R) {
    repo.create_order(new_order(Some("pi_dup"))).await.unwrap();
    let err = repo
        .create_order(new_order(Some("pi_dup")))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicatePaymentReference(r) if r == "pi_dup"));
    assert_eq!(repo.list_orders().await.unwrap().len(), 1);
}

pub async fn order_status_transitions<R: StoreRepository>(repo: &R) {
    let order = repo.create_order(new_order(None)).await.unwrap();

    let processing = repo
        .update_order_status(order.id, OrderStatus::Processing)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(processing.status, OrderStatus::Processing);

    let same = repo
        .update_order_status(order.id, OrderStatus::Processing)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(same.status, OrderStatus::Processing);

    let err = repo
        .update_order_status(order.id, OrderStatus::Delivered)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidTransition { .. }));

    let cancelled = repo
        .update_order_status(order.id, OrderStatus::Cancelled)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(cancelled.updated_at >= order.updated_at);

    let err = repo
        .update_order_status(order.id, OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidTransition { .. }));

    let missing = repo
        .update_order_status(9_999, OrderStatus::Shipped)
        .await
        .unwrap();
    assert!(missing.is_none());
}

pub async fn message_flow<R: StoreRepository>(repo: &R) {
    let m = repo
        .create_message(NewMessage {
            name: "Anna de Vries".into(),
            email: "anna@example.com".into(),
            subject: "Vraag".into(),
            message: "Hoe lang werkt de batterij?".into(),
        })
        .await
        .unwrap();
    assert_eq!(m.status, MessageStatus::New);

    let read = repo
        .update_message_status(m.id, MessageStatus::Read)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(read.status, MessageStatus::Read);

    let err = repo
        .update_message_status(m.id, MessageStatus::New)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidTransition { .. }));

    repo.update_message_status(m.id, MessageStatus::Archived)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        repo.get_message(m.id).await.unwrap().unwrap().status,
        MessageStatus::Archived
    );
    assert_eq!(repo.list_messages().await.unwrap().len(), 1);
    assert!(repo
        .update_message_status(404, MessageStatus::Read)
        .await
        .unwrap()
        .is_none());
}

pub async fn visit_stats<R: StoreRepository>(repo: &R) {
    for ip in ["10.0.0.1", "10.0.0.1", "10.0.0.2"] {
        repo.log_visit(NewVisit {
            visitor_ip: ip.into(),
            user_agent: "test".into(),
            page_path: "/producten".into(),
        })
        .await
        .unwrap();
    }
    let stats = repo.site_stats(Utc::now()).await.unwrap();
    assert_eq!(stats.total_visits, 3);
    assert_eq!(stats.unique_visitors, 2);
    assert_eq!(stats.today_visits, 3);
    assert_eq!(stats.week_visits, 3);
    assert_eq!(stats.month_visits, 3);
}
