//! Stateless admin sessions.
//!
//! Tokens are HS256 JWTs (`header.claims.signature`, base64url without
//! padding) so they can be inspected with standard tooling. Nothing is stored
//! server-side: a token is valid while its signature checks out and `exp` lies
//! in the future.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::Config;
use crate::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AdminGuard {
    mac: HmacSha256,
    username: String,
    password: String,
    ttl: Duration,
}

impl AdminGuard {
    pub fn new(
        secret: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        ttl: std::time::Duration,
    ) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid signing key: {e}"))?;
        Ok(Self {
            mac,
            username: username.into(),
            password: password.into(),
            ttl: Duration::from_std(ttl)?,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            &config.jwt_secret,
            config.admin_username.clone(),
            config.admin_password.clone(),
            config.session_ttl,
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(input);
        mac.finalize().into_bytes().to_vec()
    }

    // Compares MACs of both values so the comparison time does not depend on
    // where the first differing byte is.
    fn matches(&self, candidate: &str, expected: &str) -> bool {
        let mut mac = self.mac.clone();
        mac.update(candidate.as_bytes());
        mac.verify_slice(&self.sign(expected.as_bytes())).is_ok()
    }

    pub fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AppError> {
        // Evaluate both so a wrong username costs the same as a wrong password.
        let user_ok = self.matches(username, &self.username);
        let pass_ok = self.matches(password, &self.password);
        if !(user_ok && pass_ok) {
            tracing::warn!("admin login rejected");
            return Err(AppError::Unauthorized);
        }
        let issued = self.issue_at(username, Utc::now())?;
        tracing::info!(expires_at = %issued.expires_at, "admin session started");
        Ok(issued)
    }

    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> anyhow::Result<IssuedToken> {
        // Claims carry whole seconds; report the same instant to the caller.
        let expires_at = (now + self.ttl).trunc_subsecs(0);
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(HEADER),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let signature = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes()));
        Ok(IssuedToken {
            token: format!("{signing_input}.{signature}"),
            expires_at,
        })
    }

    pub fn authorize(&self, token: &str) -> bool {
        self.authorize_at(token, Utc::now())
    }

    /// False for anything but a well-formed, correctly signed, unexpired token.
    pub fn authorize_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        let mut parts = token.trim().split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };

        let Ok(signature) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(claims.as_bytes());
        if mac.verify_slice(&signature).is_err() {
            return false;
        }

        let header_ok = URL_SAFE_NO_PAD
            .decode(header)
            .ok()
            .and_then(|h| serde_json::from_slice::<serde_json::Value>(&h).ok())
            .is_some_and(|h| h["alg"] == "HS256");
        if !header_ok {
            return false;
        }

        match URL_SAFE_NO_PAD
            .decode(claims)
            .ok()
            .and_then(|c| serde_json::from_slice::<Claims>(&c).ok())
        {
            Some(c) => c.exp > now.timestamp() && !c.sub.is_empty(),
            None => false,
        }
    }
}
