use std::sync::Arc;

use crate::application::stock_ledger::StockLedger;
use crate::errors::AppError;
use smartlock_types::api::{PaymentIntentRequest, PlaceOrderRequest};
use smartlock_types::domain::money::{self, round_cents, to_minor_units};
use smartlock_types::domain::order::{NewOrder, Order};
use smartlock_types::domain::stock::reservations_from_cart;
use smartlock_types::domain::validation::ValidationErrors;
use smartlock_types::ports::{
    CatalogRepository, OrderRepository, PaymentGateway, PaymentIntent, RepoError,
};

/// Result of a checkout. `replayed` is set when the payment reference already
/// had an order and nothing new was stored.
#[derive(Debug, Clone)]
pub struct Placement {
    pub order: Order,
    pub replayed: bool,
}

/// Turns a paid cart into an order. Holds no state between calls.
pub struct CheckoutService<R>
where
    R: CatalogRepository + OrderRepository,
{
    repo: Arc<R>,
    ledger: StockLedger<R>,
    gateway: Arc<dyn PaymentGateway>,
}

impl<R> CheckoutService<R>
where
    R: CatalogRepository + OrderRepository,
{
    pub fn new(repo: Arc<R>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            ledger: StockLedger::new(repo.clone()),
            repo,
            gateway,
        }
    }

    /// Validates, reserves stock, then stores the order. If storing fails the
    /// reservation is released again, so stock only stays decremented for
    /// orders that exist.
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<Placement, AppError> {
        let customer = request.customer().validate();
        let reservations = reservations_from_cart(&request.cart());
        let (customer, reservations) = match (customer, reservations) {
            (Ok(c), Ok(r)) => (c, r),
            (c, r) => {
                let errors = c
                    .err()
                    .unwrap_or_default()
                    .merge(r.err().unwrap_or_default());
                return Err(AppError::Validation(errors));
            }
        };

        let reference = request
            .payment_intent_id
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        if let Some(reference) = &reference {
            if let Some(existing) = self.repo.find_by_payment_reference(reference).await? {
                tracing::info!(order_id = existing.id, %reference, "order replayed");
                return Ok(Placement {
                    order: existing,
                    replayed: true,
                });
            }
        }

        let lines = self.ledger.reserve(&reservations).await?;

        let new_order = match NewOrder::new(customer, lines, reference) {
            Ok(o) => o,
            Err(e) => {
                self.ledger.release(&reservations).await;
                return Err(AppError::Internal(e));
            }
        };

        if let Some(claimed) = request.total_amount {
            if round_cents(claimed) != new_order.total_amount {
                tracing::warn!(
                    %claimed,
                    computed = %new_order.total_amount,
                    "client total differs from computed total"
                );
            }
        }

        match self.repo.create_order(new_order).await {
            Ok(order) => {
                tracing::info!(
                    order_id = order.id,
                    total = %order.total_amount,
                    items = order.order_items.len(),
                    "order placed"
                );
                Ok(Placement {
                    order,
                    replayed: false,
                })
            }
            Err(RepoError::DuplicatePaymentReference(reference)) => {
                // A concurrent request with the same reference won the race.
                self.ledger.release(&reservations).await;
                let existing = self
                    .repo
                    .find_by_payment_reference(&reference)
                    .await?
                    .ok_or_else(|| {
                        anyhow::anyhow!("order for payment reference {reference} vanished")
                    })?;
                tracing::info!(order_id = existing.id, %reference, "order replayed");
                Ok(Placement {
                    order: existing,
                    replayed: true,
                })
            }
            Err(e) => {
                self.ledger.release(&reservations).await;
                Err(e.into())
            }
        }
    }

    pub async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, AppError> {
        let currency = request
            .currency
            .as_deref()
            .map(|c| c.trim().to_ascii_lowercase())
            .unwrap_or_else(|| money::CURRENCY.to_string());
        if currency != money::CURRENCY {
            return Err(ValidationErrors::single("currency", "only eur is supported").into());
        }

        let cents = match request.amount {
            None => return Err(ValidationErrors::single("amount", "is required").into()),
            Some(a) if a <= rust_decimal::Decimal::ZERO => {
                return Err(ValidationErrors::single("amount", "must be greater than zero").into())
            }
            Some(a) => to_minor_units(a)
                .ok_or_else(|| ValidationErrors::single("amount", "is too large"))?,
        };
        if cents == 0 {
            return Err(ValidationErrors::single("amount", "must be at least one cent").into());
        }

        let intent = self.gateway.create_intent(cents, &currency).await?;
        tracing::info!(intent_id = %intent.id, amount_cents = cents, "payment intent created");
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use smartlock_repo::memory::InMemoryRepo;
    use smartlock_types::api::CartItemRequest;
    use smartlock_types::domain::product::{NewProduct, Product, ProductCategory};
    use smartlock_types::domain::order::OrderStatus;
    use smartlock_types::domain::stock::{ReservedLine, StockReservation};
    use smartlock_types::ports::{GatewayError, ReservationError};
    use std::sync::Mutex;

    struct RecordingGateway {
        calls: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl PaymentGateway for RecordingGateway {
        async fn create_intent(
            &self,
            amount_cents: i64,
            currency: &str,
        ) -> Result<PaymentIntent, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push((amount_cents, currency.to_string()));
            Ok(PaymentIntent {
                id: "pi_test".into(),
                client_secret: "pi_test_secret".into(),
            })
        }
    }

    fn gateway() -> Arc<RecordingGateway> {
        Arc::new(RecordingGateway {
            calls: Mutex::new(Vec::new()),
        })
    }

    fn lock(price_cents: i64, stock: u32) -> NewProduct {
        NewProduct {
            name: "Smart Fietsslot Pro".into(),
            description: "Fietsslot met app".into(),
            price: Decimal::new(price_cents, 2),
            image: "/images/fietsslot.png".into(),
            category: ProductCategory::Fietsslot,
            stock,
            features: vec![],
        }
    }

    fn request(items: Vec<(i64, i64)>, reference: Option<&str>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            customer_name: "Jan Jansen".into(),
            customer_email: "jan@example.com".into(),
            customer_phone: "06-12345678".into(),
            customer_address: "Hoofdstraat 123".into(),
            customer_city: "Amsterdam".into(),
            customer_postal_code: "1000aa".into(),
            total_amount: Some(Decimal::new(1, 2)),
            order_items: items
                .into_iter()
                .map(|(id, quantity)| CartItemRequest {
                    id,
                    quantity,
                    price: None,
                })
                .collect(),
            payment_intent_id: reference.map(str::to_string),
        }
    }

    async fn setup(stock: u32) -> (Arc<InMemoryRepo>, CheckoutService<InMemoryRepo>, Product) {
        let repo = Arc::new(InMemoryRepo::new());
        let product = repo.create_product(lock(8999, stock)).await.unwrap();
        let svc = CheckoutService::new(repo.clone(), gateway());
        (repo, svc, product)
    }

    #[tokio::test]
    async fn total_is_computed_from_catalog_prices() {
        let (repo, svc, p) = setup(5).await;
        let placed = svc.place_order(request(vec![(p.id, 2)], None)).await.unwrap();
        assert!(!placed.replayed);
        assert_eq!(placed.order.total_amount, Decimal::new(17998, 2));
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.order.customer.postal_code, "1000 AA");
        assert_eq!(repo.get_product(p.id).await.unwrap().unwrap().stock, 3);
    }

    #[tokio::test]
    async fn same_reference_returns_same_order_and_reserves_once() {
        let (repo, svc, p) = setup(5).await;
        let first = svc
            .place_order(request(vec![(p.id, 2)], Some("pi_123")))
            .await
            .unwrap();
        let second = svc
            .place_order(request(vec![(p.id, 2)], Some("pi_123")))
            .await
            .unwrap();
        assert_eq!(first.order.id, second.order.id);
        assert!(second.replayed);
        assert_eq!(repo.get_product(p.id).await.unwrap().unwrap().stock, 3);
        assert_eq!(repo.list_orders().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn shortage_creates_no_order() {
        let (repo, svc, p) = setup(1).await;
        let res = svc.place_order(request(vec![(p.id, 2)], None)).await;
        assert!(matches!(res, Err(AppError::InsufficientStock(_))));
        assert!(repo.list_orders().await.unwrap().is_empty());
        assert_eq!(repo.get_product(p.id).await.unwrap().unwrap().stock, 1);
    }

    #[tokio::test]
    async fn customer_and_cart_errors_are_reported_together() {
        let (_repo, svc, _p) = setup(5).await;
        let mut req = request(vec![(1, 0)], None);
        req.customer_email = "not-an-email".into();
        match svc.place_order(req).await {
            Err(AppError::Validation(v)) => assert_eq!(
                v.fields().collect::<Vec<_>>(),
                vec!["email", "order_items[0].quantity"]
            ),
            other => panic!("unexpected: {other:?}"),
        }
    }

    /// Delegates to the in-memory store but refuses to store orders.
    struct BrokenOrderStore(InMemoryRepo);

    #[async_trait]
    impl CatalogRepository for BrokenOrderStore {
        async fn create_product(&self, p: NewProduct) -> Result<Product, RepoError> {
            self.0.create_product(p).await
        }
        async fn get_product(&self, id: i64) -> Result<Option<Product>, RepoError> {
            self.0.get_product(id).await
        }
        async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
            self.0.list_products().await
        }
        async fn update_product(
            &self,
            id: i64,
            p: NewProduct,
        ) -> Result<Option<Product>, RepoError> {
            self.0.update_product(id, p).await
        }
        async fn delete_product(&self, id: i64) -> Result<bool, RepoError> {
            self.0.delete_product(id).await
        }
        async fn reserve(
            &self,
            items: &[StockReservation],
        ) -> Result<Vec<ReservedLine>, ReservationError> {
            self.0.reserve(items).await
        }
        async fn release(&self, items: &[StockReservation]) -> Result<(), RepoError> {
            self.0.release(items).await
        }
    }

    #[async_trait]
    impl OrderRepository for BrokenOrderStore {
        async fn create_order(&self, _: NewOrder) -> Result<Order, RepoError> {
            Err(RepoError::DbError("disk full".into()))
        }
        async fn get_order(&self, id: i64) -> Result<Option<Order>, RepoError> {
            self.0.get_order(id).await
        }
        async fn find_by_payment_reference(&self, r: &str) -> Result<Option<Order>, RepoError> {
            self.0.find_by_payment_reference(r).await
        }
        async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
            self.0.list_orders().await
        }
        async fn update_order_status(
            &self,
            id: i64,
            status: OrderStatus,
        ) -> Result<Option<Order>, RepoError> {
            self.0.update_order_status(id, status).await
        }
    }

    #[tokio::test]
    async fn failed_order_write_releases_stock() {
        let repo = Arc::new(BrokenOrderStore(InMemoryRepo::new()));
        let p = repo.create_product(lock(8999, 4)).await.unwrap();
        let svc = CheckoutService::new(repo.clone(), gateway());

        let res = svc.place_order(request(vec![(p.id, 3)], Some("pi_x"))).await;
        assert!(matches!(res, Err(AppError::Internal(_))));
        assert_eq!(repo.get_product(p.id).await.unwrap().unwrap().stock, 4);
    }

    #[tokio::test]
    async fn overflowing_line_total_releases_stock() {
        // Stored directly, past the catalog's price cap.
        let repo = Arc::new(InMemoryRepo::new());
        let mut draft = lock(0, 5);
        draft.price = Decimal::MAX;
        let p = repo.create_product(draft).await.unwrap();
        let svc = CheckoutService::new(repo.clone(), gateway());

        let res = svc.place_order(request(vec![(p.id, 2)], Some("pi_big"))).await;
        assert!(matches!(res, Err(AppError::Internal(_))));
        assert_eq!(repo.get_product(p.id).await.unwrap().unwrap().stock, 5);
        assert!(repo.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_payment_amount_is_a_field_error() {
        let gw = gateway();
        let svc = CheckoutService::new(Arc::new(InMemoryRepo::new()), gw.clone());

        for amount in [Decimal::MAX, Decimal::new(i64::MAX, 0), Decimal::new(1, 3)] {
            match svc
                .create_payment_intent(PaymentIntentRequest {
                    amount: Some(amount),
                    currency: None,
                })
                .await
            {
                Err(AppError::Validation(v)) => {
                    assert_eq!(v.fields().collect::<Vec<_>>(), vec!["amount"])
                }
                other => panic!("unexpected for {amount}: {other:?}"),
            }
        }
        assert!(gw.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn payment_intent_is_requested_in_cents() {
        let repo = Arc::new(InMemoryRepo::new());
        let gw = gateway();
        let svc = CheckoutService::new(repo, gw.clone());

        let intent = svc
            .create_payment_intent(PaymentIntentRequest {
                amount: Some(Decimal::new(17998, 2)),
                currency: Some("EUR".into()),
            })
            .await
            .unwrap();
        assert_eq!(intent.client_secret, "pi_test_secret");
        assert_eq!(gw.calls.lock().unwrap()[0], (17998, "eur".to_string()));

        let res = svc
            .create_payment_intent(PaymentIntentRequest {
                amount: Some(Decimal::ZERO),
                currency: None,
            })
            .await;
        assert!(matches!(res, Err(AppError::Validation(_))));
        let res = svc
            .create_payment_intent(PaymentIntentRequest {
                amount: Some(Decimal::ONE),
                currency: Some("usd".into()),
            })
            .await;
        assert!(matches!(res, Err(AppError::Validation(_))));
        assert_eq!(gw.calls.lock().unwrap().len(), 1);
    }
}
