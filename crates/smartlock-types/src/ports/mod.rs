pub mod catalog_repository;
pub mod message_repository;
pub mod order_repository;
pub mod payment_gateway;
pub mod visit_repository;

pub use catalog_repository::{CatalogRepository, ReservationError};
pub use message_repository::MessageRepository;
pub use order_repository::OrderRepository;
pub use payment_gateway::{GatewayError, PaymentGateway, PaymentIntent};
pub use visit_repository::VisitRepository;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),

    #[error("an order for payment reference {0} already exists")]
    DuplicatePaymentReference(String),

    #[error("cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

/// Everything the storefront needs from its storage backend.
pub trait StoreRepository:
    CatalogRepository + OrderRepository + MessageRepository + VisitRepository
{
}

impl<T> StoreRepository for T where
    T: CatalogRepository + OrderRepository + MessageRepository + VisitRepository
{
}
