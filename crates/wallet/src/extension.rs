//! Capability interface of injected wallet extensions
//!
//! The session manager never talks to a concrete extension. A host resolves
//! an injection path to a [`WalletExtension`], and each wallet variant drives
//! the same suggest/enable/signer handshake through it.

use crate::error::{WalletError, WalletResult};
use crate::kind::WalletKind;
use async_trait::async_trait;
use capsule_common::tx::SignDoc;
use capsule_common::ChainInfo;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Failure reported by an extension call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    #[error("Request rejected by user: {0}")]
    Rejected(String),

    #[error("{0}")]
    Failed(String),
}

/// Account exposed by an offline signer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountData {
    pub address: String,
    pub algo: String,
    pub pubkey: Vec<u8>,
}

/// Signer handed out by an extension once access is granted
#[async_trait]
pub trait OfflineSigner: Send + Sync {
    async fn get_accounts(&self) -> Result<Vec<AccountData>, ExtensionError>;

    /// Sign a SIGN_MODE_DIRECT document; returns the 64-byte compact signature
    async fn sign_direct(
        &self,
        signer_address: &str,
        sign_doc: &SignDoc,
    ) -> Result<Vec<u8>, ExtensionError>;
}

/// Keplr-compatible provider API
#[async_trait]
pub trait WalletExtension: Send + Sync {
    async fn experimental_suggest_chain(&self, chain: &ChainInfo) -> Result<(), ExtensionError>;

    async fn enable(&self, chain_id: &str) -> Result<(), ExtensionError>;

    async fn get_offline_signer(
        &self,
        chain_id: &str,
    ) -> Result<Arc<dyn OfflineSigner>, ExtensionError>;
}

/// Environment into which extensions inject themselves
pub trait ExtensionHost: Send + Sync {
    fn lookup(&self, path: &str) -> Option<Arc<dyn WalletExtension>>;
}

/// One interchangeable wallet variant
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn kind(&self) -> WalletKind;

    fn is_installed(&self) -> bool;

    /// Register the chain, request access and return the signer
    async fn connect(&self, chain: &ChainInfo) -> WalletResult<Arc<dyn OfflineSigner>>;
}

/// Wallet variant backed by whatever the host injected at the kind's path
pub struct ExtensionWallet {
    kind: WalletKind,
    host: Arc<dyn ExtensionHost>,
}

impl ExtensionWallet {
    pub fn new(kind: WalletKind, host: Arc<dyn ExtensionHost>) -> Self {
        Self { kind, host }
    }

    fn extension(&self) -> WalletResult<Arc<dyn WalletExtension>> {
        self.host
            .lookup(self.kind.injection_path())
            .ok_or_else(|| WalletError::WalletNotInstalled(self.kind.display_name().to_string()))
    }
}

#[async_trait]
impl WalletProvider for ExtensionWallet {
    fn kind(&self) -> WalletKind {
        self.kind
    }

    fn is_installed(&self) -> bool {
        self.host.lookup(self.kind.injection_path()).is_some()
    }

    async fn connect(&self, chain: &ChainInfo) -> WalletResult<Arc<dyn OfflineSigner>> {
        let extension = self.extension()?;

        debug!("Suggesting chain {} to {}", chain.chain_id, self.kind);
        extension
            .experimental_suggest_chain(chain)
            .await
            .map_err(|e| WalletError::ChainSuggestionRejected(e.to_string()))?;

        extension
            .enable(&chain.chain_id)
            .await
            .map_err(|e| WalletError::EnableRejected(e.to_string()))?;

        let signer = extension
            .get_offline_signer(&chain.chain_id)
            .await
            .map_err(|e| WalletError::Unknown(e.to_string()))?;

        info!("{} granted access to {}", self.kind.display_name(), chain.chain_id);
        Ok(signer)
    }
}

/// Provider for a wallet tag
pub fn provider_for(kind: WalletKind, host: Arc<dyn ExtensionHost>) -> Box<dyn WalletProvider> {
    Box::new(ExtensionWallet::new(kind, host))
}
