use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::customer::Customer;
use crate::domain::lifecycle::Lifecycle;
use crate::domain::money::round_cents;
use crate::domain::stock::ReservedLine;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl Lifecycle for OrderStatus {
    const ALL: &'static [Self] = &[
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    fn allows(self, next: Self) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Processing) | (Processing, Shipped) | (Shipped, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub product_id: i64,
    /// Name at the time of purchase; the product may since have been renamed or deleted.
    #[serde(default)]
    pub product_name: String,
    pub quantity: u32,
    pub price_at_purchase: Decimal,
}

impl OrderItem {
    /// `None` when the product does not fit in a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        self.price_at_purchase.checked_mul(Decimal::from(self.quantity))
    }
}

impl From<ReservedLine> for OrderItem {
    fn from(line: ReservedLine) -> Self {
        Self {
            product_id: line.product_id,
            product_name: line.product_name,
            quantity: line.quantity,
            price_at_purchase: line.unit_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    pub customer: Customer,
    pub total_amount: Decimal,
    pub order_items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order ready to be stored; the order store assigns `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer: Customer,
    pub total_amount: Decimal,
    pub order_items: Vec<OrderItem>,
    pub payment_intent_id: Option<String>,
}

pub fn total_of(items: &[OrderItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total()?))
        .map(round_cents)
}

impl NewOrder {
    pub fn new(
        customer: Customer,
        lines: Vec<ReservedLine>,
        payment_intent_id: Option<String>,
    ) -> anyhow::Result<Self> {
        if lines.is_empty() {
            anyhow::bail!("order_items empty");
        }
        let order_items: Vec<OrderItem> = lines.into_iter().map(OrderItem::from).collect();
        if order_items.iter().any(|it| it.quantity == 0) {
            anyhow::bail!("item quantity must be > 0");
        }
        let Some(total_amount) = total_of(&order_items) else {
            anyhow::bail!("order total out of range");
        };
        Ok(Self {
            customer,
            total_amount,
            order_items,
            payment_intent_id,
        })
    }

    pub fn into_order(self, id: i64, now: DateTime<Utc>) -> Order {
        Order {
            id,
            customer: self.customer,
            total_amount: self.total_amount,
            order_items: self.order_items,
            status: OrderStatus::Pending,
            payment_intent_id: self.payment_intent_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Order {
    /// Applies `next` if allowed. Returns whether anything changed.
    pub fn transition(&mut self, next: OrderStatus) -> Result<bool, OrderStatus> {
        if !self.status.can_transition_to(next) {
            return Err(self.status);
        }
        if self.status == next {
            return Ok(false);
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(true)
    }
}
