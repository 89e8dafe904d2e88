use std::sync::Arc;

use smartlock_hex::application::admin_guard::AdminGuard;
use smartlock_hex::application::AppState;
use smartlock_hex::config::Config;
use smartlock_hex::inbound::http::{HttpServer, HttpServerConfig};
use smartlock_hex::outbound::{DisabledGateway, StripeGateway};
use smartlock_hex::ports::PaymentGateway;
use smartlock_repo::seed::seed_default_catalog;
use smartlock_repo::{build_repo, Repo};

fn payment_gateway(config: &Config) -> anyhow::Result<Arc<dyn PaymentGateway>> {
    match &config.stripe_secret_key {
        Some(key) => Ok(Arc::new(StripeGateway::new(
            &config.stripe_api_base,
            key,
            config.gateway_timeout,
        )?)),
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set; payment intents are disabled");
            Ok(Arc::new(DisabledGateway))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / JWT_SECRET / ADMIN_* when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    tracing::info!(backend = repo.backend(), "storage ready");
    if config.seed_catalog {
        seed_default_catalog(&repo).await?;
    }

    let state = AppState::new(repo, payment_gateway(&config)?, AdminGuard::from_config(&config)?);
    let http = HttpServer::new(state, HttpServerConfig::from(&config)).await?;
    http.run().await
}
