//! Payment intents through the Stripe REST API.
//!
//! Only intent creation happens server-side; the browser confirms the payment
//! with Stripe directly using the returned client secret.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use smartlock_types::ports::{GatewayError, PaymentGateway, PaymentIntent};

const PAYMENT_METHODS: [&str; 3] = ["card", "ideal", "bancontact"];

#[derive(Clone)]
pub struct StripeGateway {
    base: String,
    secret_key: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct IntentBody {
    id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl StripeGateway {
    pub fn new(
        base: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base: base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
            client,
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        let mut form: Vec<(&str, String)> = vec![
            ("amount", amount_cents.to_string()),
            ("currency", currency.to_string()),
            ("metadata[integration_check]", "accept_a_payment".into()),
        ];
        form.extend(
            PAYMENT_METHODS
                .iter()
                .map(|m| ("payment_method_types[]", m.to_string())),
        );

        let res = self
            .client
            .post(format!("{}/v1/payment_intents", self.base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let message = res
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| status.to_string());
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: IntentBody = res
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(PaymentIntent {
            id: body.id,
            client_secret: body.client_secret,
        })
    }
}

/// Stands in when no processor key is configured; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn create_intent(&self, _: i64, _: &str) -> Result<PaymentIntent, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}
