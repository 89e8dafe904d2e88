pub mod admin_guard;
pub mod analytics_service;
pub mod catalog_service;
pub mod checkout_service;
pub mod message_service;
pub mod order_service;
pub mod stock_ledger;

use std::sync::Arc;

use smartlock_types::ports::{PaymentGateway, StoreRepository};

use admin_guard::AdminGuard;
use analytics_service::AnalyticsService;
use catalog_service::CatalogService;
use checkout_service::CheckoutService;
use message_service::MessageService;
use order_service::OrderService;

/// Every service of the storefront, sharing one storage backend.
pub struct AppState<R: StoreRepository> {
    pub catalog: CatalogService<R>,
    pub checkout: CheckoutService<R>,
    pub orders: OrderService<R>,
    pub messages: MessageService<R>,
    pub analytics: AnalyticsService<R>,
    pub guard: AdminGuard,
}

impl<R: StoreRepository> AppState<R> {
    pub fn new(repo: R, gateway: Arc<dyn PaymentGateway>, guard: AdminGuard) -> Self {
        let repo = Arc::new(repo);
        Self {
            catalog: CatalogService::new(repo.clone()),
            checkout: CheckoutService::new(repo.clone(), gateway),
            orders: OrderService::new(repo.clone()),
            messages: MessageService::new(repo.clone()),
            analytics: AnalyticsService::new(repo),
            guard,
        }
    }
}
