use thiserror::Error;

/// Errors raised while talking to a Capsule node or preparing a transaction
#[derive(Error, Debug)]
pub enum ChainError {
    /// Transport level failure (connection refused, TLS, DNS, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered but the requested object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The node answered with a non-success status
    #[error("Node returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be interpreted
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid mnemonic, derivation path or raw key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Invalid bech32 address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Broadcast was rejected during CheckTx
    #[error("Broadcast rejected with code {code}: {raw_log}")]
    Broadcast { code: u32, raw_log: String },

    /// Transaction was not included before the confirmation deadline
    #[error("Transaction {0} was not included in time")]
    Timeout(String),
}

impl ChainError {
    /// Whether the failure is a network problem worth surfacing as "node unavailable"
    pub fn is_transport(&self) -> bool {
        matches!(self, ChainError::Http(_) | ChainError::Status { .. } | ChainError::Timeout(_))
    }
}

pub type ChainResult<T> = Result<T, ChainError>;
