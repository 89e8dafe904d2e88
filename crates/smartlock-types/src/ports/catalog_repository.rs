use async_trait::async_trait;

use super::RepoError;
use crate::domain::product::{NewProduct, Product};
use crate::domain::stock::{ReservedLine, StockReservation, StockShortage};

#[derive(thiserror::Error, Debug)]
pub enum ReservationError {
    #[error("insufficient stock for {} product(s)", .0.len())]
    Insufficient(Vec<StockShortage>),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[async_trait]
pub trait CatalogRepository: Send + Sync + 'static {
    async fn create_product(&self, product: NewProduct) -> Result<Product, RepoError>;
    async fn get_product(&self, id: i64) -> Result<Option<Product>, RepoError>;
    /// Ascending id.
    async fn list_products(&self) -> Result<Vec<Product>, RepoError>;
    /// Replaces every field, `stock` included, as an absolute value.
    async fn update_product(&self, id: i64, product: NewProduct)
        -> Result<Option<Product>, RepoError>;
    async fn delete_product(&self, id: i64) -> Result<bool, RepoError>;

    /// Decrements every line or none of them. Each decrement is a single
    /// conditional write that only succeeds while enough stock remains.
    async fn reserve(&self, items: &[StockReservation])
        -> Result<Vec<ReservedLine>, ReservationError>;

    /// Gives reserved quantities back. Products deleted in the meantime are skipped.
    async fn release(&self, items: &[StockReservation]) -> Result<(), RepoError>;
}
