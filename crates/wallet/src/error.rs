//! Error types for wallet sessions

use thiserror::Error;

/// Wallet session errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("{0} wallet is not installed")]
    WalletNotInstalled(String),

    #[error("Chain suggestion rejected: {0}")]
    ChainSuggestionRejected(String),

    #[error("Wallet access rejected: {0}")]
    EnableRejected(String),

    #[error("No account found in wallet")]
    NoAccountFound,

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("A wallet connection is already in progress")]
    ConnectionInProgress,

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Wallet error: {0}")]
    Unknown(String),
}

impl WalletError {
    /// Degraded-but-usable conditions that should not interrupt the user
    pub fn is_soft(&self) -> bool {
        matches!(self, WalletError::NetworkUnavailable(_))
    }
}

impl From<sled::Error> for WalletError {
    fn from(err: sled::Error) -> Self {
        WalletError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::Storage(err.to_string())
    }
}

pub type WalletResult<T> = Result<T, WalletError>;
