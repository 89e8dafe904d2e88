use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::application::AppState;
use crate::errors::AppError;
use smartlock_types::ports::StoreRepository;

pub const SESSION_COOKIE: &str = "admin_token";

/// Proof that the request carries a valid admin token. Add it as the first
/// argument of any handler that needs admin rights.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

impl<R> FromRequestParts<Arc<AppState<R>>> for AdminSession
where
    R: StoreRepository,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<R>>,
    ) -> Result<Self, Self::Rejection> {
        match session_token(&parts.headers) {
            Some(token) if state.guard.authorize(token) => Ok(AdminSession),
            _ => Err(AppError::Unauthorized),
        }
    }
}

/// The admin token from `Authorization: Bearer` or, failing that, the
/// session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|t| !t.is_empty())
}

/// Cookie attributes that depend on deployment.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicy {
    pub secure: bool,
}

impl CookiePolicy {
    pub fn session_cookie(&self, token: &str, max_age_secs: i64) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_secs}"
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    pub fn cleared_cookie(&self) -> String {
        self.session_cookie("", 0)
    }
}
