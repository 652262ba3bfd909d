//! Error types for the faucet service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use capsule_common::ChainError;
use serde_json::json;
use thiserror::Error;

/// Faucet service errors
#[derive(Error, Debug)]
pub enum FaucetError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Rate limit exceeded: try again in {retry_after_hours} hours")]
    RateLimited { retry_after_hours: u64 },

    #[error("Faucet unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Insufficient funds in faucet")]
    InsufficientFunds,

    #[error("Address already holds tokens")]
    AlreadyFunded,

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FaucetError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FaucetError::InvalidAddress(_) | FaucetError::AlreadyFunded => StatusCode::BAD_REQUEST,
            FaucetError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            FaucetError::ServiceUnavailable(_) | FaucetError::InsufficientFunds => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            FaucetError::TransactionFailed(_)
            | FaucetError::Chain(_)
            | FaucetError::Database(_)
            | FaucetError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code, also used as the metrics label
    pub fn code(&self) -> &'static str {
        match self {
            FaucetError::InvalidAddress(_) => "INVALID_ADDRESS",
            FaucetError::RateLimited { .. } => "RATE_LIMITED",
            FaucetError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            FaucetError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            FaucetError::AlreadyFunded => "ALREADY_FUNDED",
            FaucetError::TransactionFailed(_) => "TRANSACTION_FAILED",
            FaucetError::Chain(_) | FaucetError::Database(_) | FaucetError::Internal(_) => {
                "UNKNOWN_ERROR"
            }
        }
    }

    fn user_message(&self) -> String {
        match self {
            FaucetError::InvalidAddress(_) => {
                "Invalid address format. Please provide a valid Capsule address.".to_string()
            }
            FaucetError::RateLimited { retry_after_hours } => format!(
                "Rate limit exceeded. Please try again in {} hours.",
                retry_after_hours
            ),
            FaucetError::ServiceUnavailable(_) => {
                "Faucet is not configured. Please contact the administrator.".to_string()
            }
            FaucetError::InsufficientFunds => {
                "Faucet is out of funds. Please try again later.".to_string()
            }
            FaucetError::AlreadyFunded => {
                "This address already has tokens. The faucet is only for new accounts.".to_string()
            }
            FaucetError::TransactionFailed(raw_log) => format!("Transaction failed: {}", raw_log),
            FaucetError::Chain(_) | FaucetError::Database(_) | FaucetError::Internal(_) => {
                "Failed to process faucet request".to_string()
            }
        }
    }
}

impl IntoResponse for FaucetError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let mut body = json!({
            "success": false,
            "error": self.user_message(),
            "code": self.code(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        if let FaucetError::RateLimited { retry_after_hours } = &self {
            body["retryAfter"] = json!(retry_after_hours);
        }

        (status, Json(body)).into_response()
    }
}

pub type FaucetResult<T> = Result<T, FaucetError>;
