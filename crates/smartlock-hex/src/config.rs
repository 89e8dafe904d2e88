use anyhow::Context;
use std::env;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const MIN_SECRET_LEN: usize = 16;

#[derive(Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password: String,
    pub session_ttl: Duration,
    pub secure_cookies: bool,
    pub cors_origin: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub stripe_api_base: String,
    pub gateway_timeout: Duration,
    pub seed_catalog: bool,
}

// Secrets stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_port", &self.server_port)
            .field("database_url", &self.database_url)
            .field("admin_username", &self.admin_username)
            .field("session_ttl", &self.session_ttl)
            .field("secure_cookies", &self.secure_cookies)
            .field("cors_origin", &self.cors_origin)
            .field("payments_enabled", &self.stripe_secret_key.is_some())
            .field("stripe_api_base", &self.stripe_api_base)
            .field("gateway_timeout", &self.gateway_timeout)
            .field("seed_catalog", &self.seed_catalog)
            .finish_non_exhaustive()
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> anyhow::Result<Duration> {
    match lookup(key) {
        Some(v) => {
            let secs: u64 = v
                .trim()
                .parse()
                .with_context(|| format!("{key} must be a whole number of seconds"))?;
            Ok(Duration::from_secs(secs))
        }
        None => Ok(Duration::from_secs(default)),
    }
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> anyhow::Result<bool> {
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("1" | "true" | "yes") => Ok(true),
        Some("0" | "false" | "no") => Ok(false),
        Some(other) => anyhow::bail!("{key} must be true or false, got {other:?}"),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server_port = lookup("SERVER_PORT").unwrap_or_else(|| "3000".into());
        let database_url = lookup("DATABASE_URL");

        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {MIN_SECRET_LEN} bytes");
        }
        let admin_username = lookup("ADMIN_USERNAME").context("ADMIN_USERNAME must be set")?;
        let admin_password = lookup("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?;

        Ok(Self {
            server_port,
            database_url,
            jwt_secret,
            admin_username,
            admin_password,
            session_ttl: parse_secs(&lookup, "SESSION_TTL_SECS", 24 * 60 * 60)?,
            secure_cookies: parse_bool(&lookup, "SECURE_COOKIES", false)?,
            cors_origin: lookup("CORS_ORIGIN"),
            stripe_secret_key: lookup("STRIPE_SECRET_KEY"),
            stripe_api_base: lookup("STRIPE_API_BASE")
                .unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.into()),
            gateway_timeout: parse_secs(&lookup, "GATEWAY_TIMEOUT_SECS", 10)?,
            seed_catalog: parse_bool(&lookup, "SEED_CATALOG", true)?,
        })
    }
}
