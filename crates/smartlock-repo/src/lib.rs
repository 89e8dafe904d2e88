#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use smartlock_types::domain::contact::{ContactMessage, MessageStatus, NewMessage};
use smartlock_types::domain::order::{NewOrder, Order, OrderStatus};
use smartlock_types::domain::product::{NewProduct, Product};
use smartlock_types::domain::stock::{ReservedLine, StockReservation};
use smartlock_types::domain::visit::{NewVisit, SiteStats};
use smartlock_types::ports::{
    CatalogRepository, MessageRepository, OrderRepository, RepoError, ReservationError,
    VisitRepository,
};

#[cfg(feature = "memory")]
pub mod memory;
pub mod seed;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://smartlock.db";

/// The storage backend chosen at startup.
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self::Memory(memory::InMemoryRepo::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or(DEFAULT_DATABASE_URL);
        Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?))
    }

    // With both backends compiled in, a configured URL selects sqlite.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?)),
            None => Ok(Self::Memory(memory::InMemoryRepo::new())),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(_) => "sqlite",
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "memory")]
            Repo::Memory($repo) => $call,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite($repo) => $call,
        }
    };
}

#[async_trait]
impl CatalogRepository for Repo {
    async fn create_product(&self, product: NewProduct) -> Result<Product, RepoError> {
        dispatch!(self, r => r.create_product(product).await)
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>, RepoError> {
        dispatch!(self, r => r.get_product(id).await)
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        dispatch!(self, r => r.list_products().await)
    }

    async fn update_product(
        &self,
        id: i64,
        product: NewProduct,
    ) -> Result<Option<Product>, RepoError> {
        dispatch!(self, r => r.update_product(id, product).await)
    }

    async fn delete_product(&self, id: i64) -> Result<bool, RepoError> {
        dispatch!(self, r => r.delete_product(id).await)
    }

    async fn reserve(
        &self,
        items: &[StockReservation],
    ) -> Result<Vec<ReservedLine>, ReservationError> {
        dispatch!(self, r => r.reserve(items).await)
    }

    async fn release(&self, items: &[StockReservation]) -> Result<(), RepoError> {
        dispatch!(self, r => r.release(items).await)
    }
}

#[async_trait]
impl OrderRepository for Repo {
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepoError> {
        dispatch!(self, r => r.create_order(order).await)
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.get_order(id).await)
    }

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.find_by_payment_reference(reference).await)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        dispatch!(self, r => r.list_orders().await)
    }

    async fn update_order_status(
        &self,
        id: i64,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.update_order_status(id, status).await)
    }
}

#[async_trait]
impl MessageRepository for Repo {
    async fn create_message(&self, message: NewMessage) -> Result<ContactMessage, RepoError> {
        dispatch!(self, r => r.create_message(message).await)
    }

    async fn get_message(&self, id: i64) -> Result<Option<ContactMessage>, RepoError> {
        dispatch!(self, r => r.get_message(id).await)
    }

    async fn list_messages(&self) -> Result<Vec<ContactMessage>, RepoError> {
        dispatch!(self, r => r.list_messages().await)
    }

    async fn update_message_status(
        &self,
        id: i64,
        status: MessageStatus,
    ) -> Result<Option<ContactMessage>, RepoError> {
        dispatch!(self, r => r.update_message_status(id, status).await)
    }
}

#[async_trait]
impl VisitRepository for Repo {
    async fn log_visit(&self, visit: NewVisit) -> Result<(), RepoError> {
        dispatch!(self, r => r.log_visit(visit).await)
    }

    async fn site_stats(&self, now: DateTime<Utc>) -> Result<SiteStats, RepoError> {
        dispatch!(self, r => r.site_stats(now).await)
    }
}
