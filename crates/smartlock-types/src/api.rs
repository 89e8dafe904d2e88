//! JSON payloads of the storefront HTTP API.
//!
//! Checkout and contact bodies keep the field names the storefront UI sends.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::{Customer, CustomerInput};
use crate::domain::order::{Order, OrderStatus};
use crate::domain::stock::{CartLine, StockShortage};
use crate::domain::validation::FieldError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_address: String,
    #[serde(default)]
    pub customer_city: String,
    #[serde(default)]
    pub customer_postal_code: String,
    /// Informational only; the order total is always computed server-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub order_items: Vec<CartItemRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItemRequest {
    #[serde(alias = "product_id")]
    pub id: i64,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

impl PlaceOrderRequest {
    pub fn customer(&self) -> CustomerInput {
        CustomerInput {
            name: self.customer_name.clone(),
            email: self.customer_email.clone(),
            phone: self.customer_phone.clone(),
            address: self.customer_address.clone(),
            city: self.customer_city.clone(),
            postal_code: self.customer_postal_code.clone(),
        }
    }

    pub fn cart(&self) -> Vec<CartLine> {
        self.order_items
            .iter()
            .map(|it| CartLine {
                product_id: it.id,
                quantity: it.quantity,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub order_id: i64,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub vat_amount: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageCreatedResponse {
    pub message_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackVisitRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub page_path: String,
}

/// Order as shown in the back-office, with line items resolved against the
/// current catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminOrderView {
    pub id: i64,
    pub customer: Customer,
    pub total_amount: Decimal,
    pub vat_amount: Decimal,
    pub order_items: Vec<AdminOrderItemView>,
    pub status: OrderStatus,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminOrderItemView {
    pub product_id: i64,
    pub product_name: String,
    /// False once the product has been removed from the catalog.
    pub product_available: bool,
    pub quantity: u32,
    pub price_at_purchase: Decimal,
    pub line_total: Decimal,
}

impl From<&Order> for PlaceOrderResponse {
    fn from(o: &Order) -> Self {
        Self {
            order_id: o.id,
            status: o.status,
            total_amount: o.total_amount,
            vat_amount: crate::domain::money::vat_included(o.total_amount),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortages: Option<Vec<StockShortage>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_storefront_checkout_body() {
        let body = serde_json::json!({
            "customer_name": "Jan Jansen",
            "customer_email": "jan@example.com",
            "customer_phone": "06-12345678",
            "customer_address": "Hoofdstraat 123",
            "customer_city": "Amsterdam",
            "customer_postal_code": "1000 AA",
            "total_amount": 1.0,
            "order_items": [{"id": 1, "quantity": 2, "price": 89.99}],
            "payment_intent_id": "pi_123"
        });
        let req: PlaceOrderRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.cart(), vec![CartLine { product_id: 1, quantity: 2 }]);
        assert_eq!(req.customer().postal_code, "1000 AA");
        assert_eq!(req.payment_intent_id.as_deref(), Some("pi_123"));
    }

    #[test]
    fn place_order_response_is_camel_case() {
        let res = PlaceOrderResponse {
            order_id: 3,
            status: OrderStatus::Pending,
            total_amount: Decimal::new(17998, 2),
            vat_amount: Decimal::new(3124, 2),
        };
        let v = serde_json::to_value(res).unwrap();
        assert_eq!(v["orderId"], 3);
        assert_eq!(v["status"], "pending");
        assert_eq!(v["totalAmount"], "179.98");
    }
}
