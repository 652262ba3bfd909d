//! Wallet session management for Capsule Network
//!
//! Connects Keplr-compatible browser wallets through a host abstraction,
//! keeps one session per manager and persists just enough of it to reconnect
//! silently on the next start.

pub mod client;
pub mod error;
pub mod extension;
pub mod kind;
pub mod session;
pub mod storage;

pub use client::{ChainQueryClient, ClientConnector, LcdConnector};
pub use error::{WalletError, WalletResult};
pub use extension::{
    AccountData, ExtensionError, ExtensionHost, ExtensionWallet, OfflineSigner, WalletExtension,
    WalletProvider,
};
pub use kind::WalletKind;
pub use session::{Session, SessionState, WalletAvailability, WalletSessionManager};
pub use storage::{MemorySessionStore, PersistedSession, SessionStore, SledSessionStore};
