//! Shared chain plumbing for Capsule Network services
//!
//! - Chain descriptor and coin/fee types
//! - Bech32 addressing
//! - REST (LCD) client
//! - `MsgSend` construction and signing
//! - Logging and config loading

pub mod address;
pub mod chain;
pub mod error;
pub mod lcd;
pub mod tx;
pub mod types;
pub mod utils;

pub use chain::ChainInfo;
pub use error::{ChainError, ChainResult};
pub use lcd::{AccountInfo, LcdClient};
pub use types::{Coin, StdFee, TxResponse};
