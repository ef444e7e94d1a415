//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::{PasswordError, TokenError};
use crate::domain::{AmountError, DomainError};
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Login failed; never says whether the number or the password was wrong
    #[error("Invalid account number or password")]
    InvalidCredentials,

    /// Uniform gate rejection; carries no detail by construction
    #[error("Forbidden")]
    Forbidden,

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Infrastructure errors
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Token service error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<AmountError> for AppError {
    fn from(err: AmountError) -> Self {
        AppError::Domain(DomainError::InvalidAmount(err.to_string()))
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        if err.is_auth_error() {
            AppError::Forbidden
        } else {
            AppError::Crypto(err.to_string())
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Crypto(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }
            AppError::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, "invalid_credentials", None)
            }

            // 403 Forbidden
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", None),

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => match domain_err {
                DomainError::InsufficientFunds { .. } => {
                    (StatusCode::BAD_REQUEST, "insufficient_funds", None)
                }
                DomainError::InvalidAmount(msg) => {
                    (StatusCode::BAD_REQUEST, "invalid_amount", Some(msg.clone()))
                }
                DomainError::SameAccountTransfer => {
                    (StatusCode::BAD_REQUEST, "same_account_transfer", None)
                }
                DomainError::AccountNotFound(number) => {
                    (StatusCode::NOT_FOUND, "account_not_found", Some(number.clone()))
                }
            },

            // Store errors keep their taxonomy
            AppError::Store(store_err) => match store_err {
                StoreError::NotFound(what) => {
                    (StatusCode::NOT_FOUND, "account_not_found", Some(what.clone()))
                }
                StoreError::ConstraintViolation(_) => {
                    (StatusCode::CONFLICT, "constraint_violation", None)
                }
                StoreError::NegativeBalance(_) => {
                    (StatusCode::BAD_REQUEST, "insufficient_funds", None)
                }
                StoreError::BalanceOverflow(_) => {
                    (StatusCode::CONFLICT, "balance_overflow", None)
                }
                StoreError::Unavailable(msg) => {
                    tracing::error!("Store unavailable: {}", msg);
                    (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", None)
                }
                StoreError::Inconsistent(msg) => {
                    tracing::error!("Store inconsistent: {}", msg);
                    (StatusCode::INTERNAL_SERVER_ERROR, "store_inconsistent", None)
                }
                StoreError::Database(msg) => {
                    tracing::error!("Database error: {}", msg);
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
                }
            },

            // 500 Internal Server Error
            AppError::Crypto(msg) => {
                tracing::error!("Token service error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "crypto_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        }
    }

    /// Message safe to return to clients
    fn public_message(&self) -> String {
        match self {
            AppError::Store(StoreError::Unavailable(_)) => "Service temporarily unavailable".to_string(),
            AppError::Store(StoreError::Database(_))
            | AppError::Store(StoreError::Inconsistent(_))
            | AppError::Crypto(_)
            | AppError::Internal(_)
            | AppError::Config(_) => "Internal server error".to_string(),
            AppError::Store(StoreError::NegativeBalance(_)) => "Insufficient funds".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = self.status_and_code();

        let body = ErrorResponse {
            error: self.public_message(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
