use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::{
    routing::{get, post, put},
    serve, Extension, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::auth::CookiePolicy;
use super::handlers::*;
use crate::application::AppState;
use smartlock_types::ports::StoreRepository;

#[derive(Clone, Debug, Default)]
pub struct HttpServerConfig {
    pub port: String,
    /// Browser origin allowed to call the API with credentials.
    pub cors_origin: Option<String>,
    pub secure_cookies: bool,
}

impl From<&crate::config::Config> for HttpServerConfig {
    fn from(c: &crate::config::Config) -> Self {
        Self {
            port: c.server_port.clone(),
            cors_origin: c.cors_origin.clone(),
            secure_cookies: c.secure_cookies,
        }
    }
}

pub struct HttpServer<R>
where
    R: StoreRepository,
{
    pub state: Arc<AppState<R>>,
    pub config: HttpServerConfig,
}

impl<R> HttpServer<R>
where
    R: StoreRepository,
{
    pub async fn new(state: AppState<R>, config: HttpServerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            state: Arc::new(state),
            config,
        })
    }

    pub fn router(&self) -> anyhow::Result<Router> {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let cookies = CookiePolicy {
            secure: self.config.secure_cookies,
        };

        let app = Router::new()
            .route("/health", get(health))
            .route(
                "/products",
                get(list_products::<R>).post(create_product::<R>),
            )
            .route(
                "/products/{id}",
                get(get_product::<R>)
                    .put(update_product::<R>)
                    .delete(delete_product::<R>),
            )
            .route("/orders", post(place_order::<R>))
            .route("/orders/{id}/status", put(update_order_status::<R>))
            .route("/payment-intents", post(create_payment_intent::<R>))
            .route("/contact", post(submit_message::<R>))
            .route("/analytics/track", post(track_visit::<R>))
            .route("/admin/login", post(login::<R>))
            .route("/admin/logout", post(logout))
            .route("/admin/orders", get(admin_list_orders::<R>))
            .route("/admin/contact", get(admin_list_messages::<R>))
            .route("/admin/contact/{id}/status", put(update_message_status::<R>))
            .route("/admin/analytics", get(admin_stats::<R>))
            .layer(Extension(cookies))
            .layer(trace_layer)
            .with_state(self.state.clone());

        let app = match &self.config.cors_origin {
            Some(origin) => app.layer(
                CorsLayer::new()
                    .allow_origin(origin.parse::<HeaderValue>()?)
                    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                    .allow_headers([CONTENT_TYPE, AUTHORIZATION])
                    .allow_credentials(true),
            ),
            None => app,
        };
        Ok(app)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router()?;
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}
