//! Typed client for the SmartLock store API.

use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use smartlock_types::api::{
    AdminOrderView, ErrorResponse, LoginRequest, LoginResponse, MessageCreatedResponse,
    PaymentIntentRequest, PaymentIntentResponse, PlaceOrderRequest, PlaceOrderResponse,
    TrackVisitRequest, UpdateStatusRequest,
};
use smartlock_types::domain::contact::{ContactMessage, MessageDraft, MessageStatus};
use smartlock_types::domain::order::{Order, OrderStatus};
use smartlock_types::domain::product::{Product, ProductDraft};
use smartlock_types::domain::visit::SiteStats;

pub use smartlock_types::api;
pub use smartlock_types::domain;

/// A non-2xx answer from the API, with the server's error body when it sent one.
#[derive(thiserror::Error, Debug, Clone)]
#[error("{status}: {}", .body.error)]
pub struct ApiError {
    pub status: reqwest::StatusCode,
    pub body: ErrorResponse,
}

#[derive(Clone)]
pub struct StoreClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    token: Option<String>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct StoreClient {
    base: Url,
    client: reqwest::Client,
    token: Option<String>,
}

impl StoreClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<StoreClientBuilder> {
        let mut base = Url::parse(base_url).context("invalid base url")?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(StoreClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            token: None,
            client: None,
        })
    }

    /// Same client, sending `token` as the admin bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> anyhow::Result<RequestBuilder> {
        let url = self.base.join(path).context("failed to join url")?;
        let req = self.client.request(method, url);
        Ok(match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        })
    }

    async fn send(&self, req: RequestBuilder) -> anyhow::Result<Response> {
        let res = req.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.json::<ErrorResponse>().await.unwrap_or_else(|_| ErrorResponse {
            error: status.canonical_reason().unwrap_or("request failed").to_string(),
            fields: None,
            shortages: None,
        });
        tracing::debug!(%status, error = %body.error, "api request failed");
        Err(ApiError { status, body }.into())
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> anyhow::Result<T> {
        Ok(self.send(req).await?.json().await?)
    }

    pub async fn health(&self) -> anyhow::Result<()> {
        self.send(self.request(Method::GET, "health")?).await?;
        Ok(())
    }

    pub async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        self.json(self.request(Method::GET, "products")?).await
    }

    pub async fn get_product(&self, id: i64) -> anyhow::Result<Product> {
        self.json(self.request(Method::GET, &format!("products/{id}"))?)
            .await
    }

    pub async fn create_product(&self, draft: &ProductDraft) -> anyhow::Result<Product> {
        self.json(self.request(Method::POST, "products")?.json(draft))
            .await
    }

    pub async fn update_product(&self, id: i64, draft: &ProductDraft) -> anyhow::Result<Product> {
        self.json(
            self.request(Method::PUT, &format!("products/{id}"))?
                .json(draft),
        )
        .await
    }

    pub async fn delete_product(&self, id: i64) -> anyhow::Result<()> {
        self.send(self.request(Method::DELETE, &format!("products/{id}"))?)
            .await?;
        Ok(())
    }

    /// Places an order. A replay of a known payment reference returns the
    /// original order.
    pub async fn place_order(&self, req: &PlaceOrderRequest) -> anyhow::Result<PlaceOrderResponse> {
        self.json(self.request(Method::POST, "orders")?.json(req))
            .await
    }

    pub async fn create_payment_intent(
        &self,
        req: &PaymentIntentRequest,
    ) -> anyhow::Result<PaymentIntentResponse> {
        self.json(self.request(Method::POST, "payment-intents")?.json(req))
            .await
    }

    pub async fn submit_message(&self, draft: &MessageDraft) -> anyhow::Result<MessageCreatedResponse> {
        self.json(self.request(Method::POST, "contact")?.json(draft))
            .await
    }

    pub async fn track_visit(&self, req: &TrackVisitRequest) -> anyhow::Result<()> {
        self.send(self.request(Method::POST, "analytics/track")?.json(req))
            .await?;
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<LoginResponse> {
        let body = LoginRequest {
            username: username.into(),
            password: password.into(),
        };
        self.json(self.request(Method::POST, "admin/login")?.json(&body))
            .await
    }

    pub async fn logout(&self) -> anyhow::Result<()> {
        self.send(self.request(Method::POST, "admin/logout")?).await?;
        Ok(())
    }

    pub async fn admin_orders(&self) -> anyhow::Result<Vec<AdminOrderView>> {
        self.json(self.request(Method::GET, "admin/orders")?).await
    }

    pub async fn update_order_status(&self, id: i64, status: OrderStatus) -> anyhow::Result<Order> {
        let body = UpdateStatusRequest {
            status: status.as_str().into(),
        };
        self.json(
            self.request(Method::PUT, &format!("orders/{id}/status"))?
                .json(&body),
        )
        .await
    }

    pub async fn admin_messages(&self) -> anyhow::Result<Vec<ContactMessage>> {
        self.json(self.request(Method::GET, "admin/contact")?).await
    }

    pub async fn update_message_status(
        &self,
        id: i64,
        status: MessageStatus,
    ) -> anyhow::Result<ContactMessage> {
        let body = UpdateStatusRequest {
            status: status.as_str().into(),
        };
        self.json(
            self.request(Method::PUT, &format!("admin/contact/{id}/status"))?
                .json(&body),
        )
        .await
    }

    pub async fn site_stats(&self) -> anyhow::Result<SiteStats> {
        self.json(self.request(Method::GET, "admin/analytics")?).await
    }
}

impl StoreClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<StoreClient> {
        if let Some(client) = self.client {
            return Ok(StoreClient {
                base: self.base,
                client,
                token: self.token,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(StoreClient {
            base: self.base,
            client,
            token: self.token,
        })
    }
}
