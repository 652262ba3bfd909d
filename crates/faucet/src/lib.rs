//! Testnet token faucet for Capsule Network
//!
//! Dispenses a fixed amount to fresh accounts with:
//! - Bech32 format validation
//! - Per-address cooldown through a pluggable store
//! - Dispenser balance and recipient pre-funding checks
//! - Prometheus metrics

pub mod api;
pub mod chain;
pub mod config;
pub mod database;
pub mod error;
pub mod metrics;
pub mod rate_limit;
pub mod service;

pub use chain::{CosmosDispenser, Dispenser};
pub use config::FaucetConfig;
pub use database::SledRateLimitStore;
pub use error::{FaucetError, FaucetResult};
pub use rate_limit::{MemoryRateLimitStore, RateLimitStore};
pub use service::{DispenseResult, FaucetService, FaucetStatus, StatusDetails};
