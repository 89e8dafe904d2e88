use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use smartlock_types::domain::contact::{ContactMessage, MessageStatus, NewMessage};
use smartlock_types::domain::lifecycle::Lifecycle;
use smartlock_types::domain::order::{NewOrder, Order, OrderStatus};
use smartlock_types::domain::product::{NewProduct, Product};
use smartlock_types::domain::stock::{ReservedLine, StockReservation, StockShortage};
use smartlock_types::domain::visit::{NewVisit, SiteStats, SiteVisit};
use smartlock_types::ports::{
    CatalogRepository, MessageRepository, OrderRepository, RepoError, ReservationError,
    VisitRepository,
};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Ids start at 1 and are never reused, matching an autoincrement column.
struct Sequence(AtomicI64);

impl Sequence {
    fn new() -> Self {
        Self(AtomicI64::new(1))
    }

    fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

struct Inner {
    products: DashMap<i64, Product>,
    product_ids: Sequence,
    orders: DashMap<i64, Order>,
    order_refs: DashMap<String, i64>,
    order_ids: Sequence,
    messages: DashMap<i64, ContactMessage>,
    message_ids: Sequence,
    visits: DashMap<i64, SiteVisit>,
    visit_ids: Sequence,
}

#[derive(Clone)]
pub struct InMemoryRepo {
    inner: Arc<Inner>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                products: DashMap::new(),
                product_ids: Sequence::new(),
                orders: DashMap::new(),
                order_refs: DashMap::new(),
                order_ids: Sequence::new(),
                messages: DashMap::new(),
                message_ids: Sequence::new(),
                visits: DashMap::new(),
                visit_ids: Sequence::new(),
            }),
        }
    }

    fn restore(&self, items: &[StockReservation]) {
        for item in items {
            if let Some(mut p) = self.inner.products.get_mut(&item.product_id) {
                p.stock = p.stock.saturating_add(item.quantity);
            }
        }
    }

    fn store_order(&self, order: NewOrder) -> Order {
        let order = order.into_order(self.inner.order_ids.next(), Utc::now());
        self.inner.orders.insert(order.id, order.clone());
        order
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryRepo {
    async fn create_product(&self, product: NewProduct) -> Result<Product, RepoError> {
        let product = product.into_product(self.inner.product_ids.next(), Utc::now());
        self.inner.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>, RepoError> {
        Ok(self.inner.products.get(&id).map(|r| r.clone()))
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        let mut all: Vec<Product> = self
            .inner
            .products
            .iter()
            .map(|kv| kv.value().clone())
            .collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }

    async fn update_product(
        &self,
        id: i64,
        product: NewProduct,
    ) -> Result<Option<Product>, RepoError> {
        if let Some(mut v) = self.inner.products.get_mut(&id) {
            let created_at = v.created_at;
            *v = product.into_product(id, created_at);
            return Ok(Some(v.clone()));
        }
        Ok(None)
    }

    async fn delete_product(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.inner.products.remove(&id).is_some())
    }

    async fn reserve(
        &self,
        items: &[StockReservation],
    ) -> Result<Vec<ReservedLine>, ReservationError> {
        let mut applied = Vec::with_capacity(items.len());
        let mut lines = Vec::with_capacity(items.len());
        let mut shortages = Vec::new();

        for item in items {
            // The entry lock makes check-and-decrement one step per product.
            match self.inner.products.get_mut(&item.product_id) {
                Some(mut p) if p.stock >= item.quantity => {
                    p.stock -= item.quantity;
                    applied.push(*item);
                    lines.push(ReservedLine {
                        product_id: p.id,
                        product_name: p.name.clone(),
                        quantity: item.quantity,
                        unit_price: p.price,
                    });
                }
                Some(p) => shortages.push(StockShortage {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available: Some(p.stock),
                }),
                None => shortages.push(StockShortage {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available: None,
                }),
            }
        }

        if shortages.is_empty() {
            return Ok(lines);
        }
        self.restore(&applied);
        Err(ReservationError::Insufficient(shortages))
    }

    async fn release(&self, items: &[StockReservation]) -> Result<(), RepoError> {
        self.restore(items);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepoError> {
        let Some(reference) = order.payment_intent_id.clone() else {
            return Ok(self.store_order(order));
        };
        match self.inner.order_refs.entry(reference) {
            Entry::Occupied(e) => Err(RepoError::DuplicatePaymentReference(e.key().clone())),
            Entry::Vacant(e) => {
                // Store the order before publishing the reference so a lookup
                // by reference never finds a dangling id.
                let order = self.store_order(order);
                e.insert(order.id);
                Ok(order)
            }
        }
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, RepoError> {
        Ok(self.inner.orders.get(&id).map(|r| r.clone()))
    }

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Order>, RepoError> {
        let id = self.inner.order_refs.get(reference).map(|r| *r);
        match id {
            Some(id) => self.get_order(id).await,
            None => Ok(None),
        }
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        let mut all: Vec<Order> = self
            .inner
            .orders
            .iter()
            .map(|kv| kv.value().clone())
            .collect();
        all.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(all)
    }

    async fn update_order_status(
        &self,
        id: i64,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        let Some(mut v) = self.inner.orders.get_mut(&id) else {
            return Ok(None);
        };
        v.transition(status)
            .map_err(|from| RepoError::InvalidTransition {
                from: from.to_string(),
                to: status.to_string(),
            })?;
        Ok(Some(v.clone()))
    }
}

#[async_trait]
impl MessageRepository for InMemoryRepo {
    async fn create_message(&self, message: NewMessage) -> Result<ContactMessage, RepoError> {
        let message = message.into_message(self.inner.message_ids.next(), Utc::now());
        self.inner.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn get_message(&self, id: i64) -> Result<Option<ContactMessage>, RepoError> {
        Ok(self.inner.messages.get(&id).map(|r| r.clone()))
    }

    async fn list_messages(&self) -> Result<Vec<ContactMessage>, RepoError> {
        let mut all: Vec<ContactMessage> = self
            .inner
            .messages
            .iter()
            .map(|kv| kv.value().clone())
            .collect();
        all.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(all)
    }

    async fn update_message_status(
        &self,
        id: i64,
        status: MessageStatus,
    ) -> Result<Option<ContactMessage>, RepoError> {
        let Some(mut v) = self.inner.messages.get_mut(&id) else {
            return Ok(None);
        };
        if !v.status.can_transition_to(status) {
            return Err(RepoError::InvalidTransition {
                from: v.status.to_string(),
                to: status.to_string(),
            });
        }
        v.status = status;
        Ok(Some(v.clone()))
    }
}

#[async_trait]
impl VisitRepository for InMemoryRepo {
    async fn log_visit(&self, visit: NewVisit) -> Result<(), RepoError> {
        let id = self.inner.visit_ids.next();
        self.inner.visits.insert(
            id,
            SiteVisit {
                id,
                visitor_ip: visit.visitor_ip,
                user_agent: visit.user_agent,
                page_path: visit.page_path,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn site_stats(&self, now: DateTime<Utc>) -> Result<SiteStats, RepoError> {
        let visits: Vec<SiteVisit> = self
            .inner
            .visits
            .iter()
            .map(|kv| kv.value().clone())
            .collect();
        Ok(SiteStats::from_visits(&visits, now))
    }
}
