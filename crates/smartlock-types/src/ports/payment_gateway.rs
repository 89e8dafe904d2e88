use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Handle returned by the payment processor. The client secret is handed to
/// the browser, which confirms the payment with the processor directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("payment gateway is not configured")]
    NotConfigured,

    #[error("payment gateway unreachable: {0}")]
    Transport(String),

    #[error("payment gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentIntent, GatewayError>;
}
