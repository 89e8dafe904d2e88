use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use smartlock_types::api::ErrorResponse;
use smartlock_types::domain::stock::StockShortage;
use smartlock_types::domain::validation::ValidationErrors;
use smartlock_types::ports::{GatewayError, RepoError, ReservationError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Insufficient stock for {} product(s)", .0.len())]
    InsufficientStock(Vec<StockShortage>),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationErrors> for AppError {
    fn from(e: ValidationErrors) -> Self {
        AppError::Validation(e)
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::InvalidTransition { from, to } => AppError::Validation(
                ValidationErrors::single("status", format!("cannot change from {from} to {to}")),
            ),
            other => AppError::Internal(anyhow::anyhow!(other.to_string())),
        }
    }
}

impl From<ReservationError> for AppError {
    fn from(e: ReservationError) -> Self {
        match e {
            ReservationError::Insufficient(shortages) => AppError::InsufficientStock(shortages),
            ReservationError::Repo(e) => e.into(),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        AppError::Gateway(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, body) = match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "validation failed".into(),
                    fields: Some(errors.0),
                    shortages: None,
                },
            ),
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, plain(m)),
            AppError::InsufficientStock(shortages) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "insufficient stock".into(),
                    fields: None,
                    shortages: Some(shortages),
                },
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, plain("unauthorized")),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, plain(format!("{m} not found"))),
            AppError::Gateway(detail) => {
                tracing::warn!(%detail, "payment gateway call failed");
                (StatusCode::BAD_GATEWAY, plain("payment failed"))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, plain("internal error"))
            }
        };

        let body = serde_json::to_string(&body)
            .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (code, [("content-type", "application/json")], body).into_response()
    }
}

fn plain(error: impl Into<String>) -> ErrorResponse {
    ErrorResponse {
        error: error.into(),
        fields: None,
        shortages: None,
    }
}
