use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::AppError;
use smartlock_types::api::{AdminOrderItemView, AdminOrderView};
use smartlock_types::domain::money::vat_included;
use smartlock_types::domain::order::{Order, OrderStatus, UnknownStatus};
use smartlock_types::domain::validation::ValidationErrors;
use smartlock_types::ports::{CatalogRepository, OrderRepository};

pub const UNKNOWN_PRODUCT: &str = "unknown product";

/// Back-office view of placed orders. Orders are created only by checkout and
/// are never deleted.
pub struct OrderService<R>
where
    R: CatalogRepository + OrderRepository,
{
    repo: Arc<R>,
}

impl<R> OrderService<R>
where
    R: CatalogRepository + OrderRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn get_order(&self, id: i64) -> Result<Order, AppError> {
        self.repo
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))
    }

    /// Newest first, with line items resolved against the current catalog.
    pub async fn list_orders(&self) -> Result<Vec<AdminOrderView>, AppError> {
        let orders = self.repo.list_orders().await?;
        let names: HashMap<i64, String> = self
            .repo
            .list_products()
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
        orders.into_iter().map(|o| enrich(o, &names)).collect()
    }

    /// `status` arrives as raw text so an unrecognised value is reported as a
    /// field error rather than a body rejection.
    pub async fn update_status(&self, id: i64, status: &str) -> Result<Order, AppError> {
        let next: OrderStatus = status
            .parse()
            .map_err(|e: UnknownStatus| ValidationErrors::single("status", e.to_string()))?;
        let order = self
            .repo
            .update_order_status(id, next)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
        tracing::info!(order_id = id, status = %order.status, "order status updated");
        Ok(order)
    }
}

fn enrich(order: Order, names: &HashMap<i64, String>) -> Result<AdminOrderView, AppError> {
    let order_items = order
        .order_items
        .iter()
        .map(|item| {
            let line_total = item.line_total().ok_or_else(|| {
                anyhow::anyhow!("line total out of range in order {}", order.id)
            })?;
            let current = names.get(&item.product_id);
            let product_name = match current {
                Some(name) => name.clone(),
                None if !item.product_name.is_empty() => item.product_name.clone(),
                None => UNKNOWN_PRODUCT.to_string(),
            };
            Ok(AdminOrderItemView {
                product_id: item.product_id,
                product_name,
                product_available: current.is_some(),
                quantity: item.quantity,
                price_at_purchase: item.price_at_purchase,
                line_total,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;
    Ok(AdminOrderView {
        id: order.id,
        vat_amount: vat_included(order.total_amount),
        total_amount: order.total_amount,
        customer: order.customer,
        order_items,
        status: order.status,
        payment_intent_id: order.payment_intent_id,
        created_at: order.created_at,
        updated_at: order.updated_at,
    })
}
