use async_trait::async_trait;

use super::RepoError;
use crate::domain::order::{NewOrder, Order, OrderStatus};

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Assigns the next id. Fails with [`RepoError::DuplicatePaymentReference`]
    /// if an order already carries the same payment reference.
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepoError>;
    async fn get_order(&self, id: i64) -> Result<Option<Order>, RepoError>;
    async fn find_by_payment_reference(&self, reference: &str)
        -> Result<Option<Order>, RepoError>;
    /// Newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, RepoError>;
    /// `Ok(None)` when the order does not exist, [`RepoError::InvalidTransition`]
    /// when the move is not allowed from its current status.
    async fn update_order_status(
        &self,
        id: i64,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError>;
}
