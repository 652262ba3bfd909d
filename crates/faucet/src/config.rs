//! Faucet configuration

use capsule_common::address::DEFAULT_ADDRESS_BODY_LEN;
use capsule_common::chain::{
    DEFAULT_BASE_DENOM, DEFAULT_BECH32_PREFIX, DEFAULT_CHAIN_ID, DEFAULT_DECIMALS,
    DEFAULT_DISPLAY_DENOM,
};
use capsule_common::utils::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Faucet service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaucetConfig {
    /// Server address
    pub server_addr: String,

    /// REST (LCD) endpoint of a Capsule node
    pub rest_url: String,

    /// Chain the dispenser signs for
    pub chain_id: String,

    /// Bech32 account prefix accepted for recipients
    pub address_prefix: String,

    /// Number of data characters after `<prefix>1`
    pub address_body_len: usize,

    /// Base denom dispensed
    pub denom: String,

    /// Display denom reported to users
    pub display_denom: String,

    /// Decimals between base and display denom
    pub decimals: u32,

    /// Dispenser BIP39 mnemonic
    pub mnemonic: Option<String>,

    /// Dispenser raw secp256k1 key (hex); used when no mnemonic is set
    pub private_key: Option<String>,

    /// Amount per request, base units
    pub dispense_amount: u64,

    /// Fee paid per transfer, base units
    pub fee_amount: u64,

    /// Gas limit for transfers
    pub gas_limit: u64,

    /// Memo attached to every transfer
    pub memo: String,

    /// Cooldown per recipient address (hours)
    pub rate_limit_hours: u64,

    /// Process-wide request ceiling
    pub max_requests_per_minute: u32,

    /// Block explorer base URL, used to build `explorerUrl`
    pub explorer_url: String,

    /// Persist rate-limit entries in sled at this path; in-memory when unset
    pub db_path: Option<String>,

    /// How long to wait for a broadcast transaction to be included
    pub broadcast_timeout_secs: u64,

    /// Delay between inclusion polls
    pub poll_interval_secs: u64,

    /// Enable CORS
    pub cors_enabled: bool,

    pub logging: LoggingConfig,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:3000".to_string(),
            rest_url: "http://localhost:1317".to_string(),
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            address_prefix: DEFAULT_BECH32_PREFIX.to_string(),
            address_body_len: DEFAULT_ADDRESS_BODY_LEN,
            denom: DEFAULT_BASE_DENOM.to_string(),
            display_denom: DEFAULT_DISPLAY_DENOM.to_string(),
            decimals: DEFAULT_DECIMALS,
            mnemonic: None,
            private_key: None,
            dispense_amount: 5_000_000, // 5 CAPS
            fee_amount: 5_000,
            gas_limit: 200_000,
            memo: "Capsule Network testnet faucet".to_string(),
            rate_limit_hours: 24,
            max_requests_per_minute: 30,
            explorer_url: "https://explorer.capsule.network/capsule-testnet".to_string(),
            db_path: None,
            broadcast_timeout_secs: 60,
            poll_interval_secs: 3,
            cors_enabled: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl FaucetConfig {
    /// Load from environment variables with defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `FAUCET_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var("FAUCET_SERVER_ADDR") {
            self.server_addr = addr;
        }

        if let Ok(url) = std::env::var("FAUCET_REST_URL") {
            self.rest_url = url;
        }

        if let Ok(chain_id) = std::env::var("FAUCET_CHAIN_ID") {
            self.chain_id = chain_id;
        }

        if let Ok(prefix) = std::env::var("FAUCET_ADDRESS_PREFIX") {
            self.address_prefix = prefix;
        }

        if let Ok(denom) = std::env::var("FAUCET_DENOM") {
            self.denom = denom;
        }

        if let Ok(mnemonic) = std::env::var("FAUCET_MNEMONIC") {
            if !mnemonic.trim().is_empty() {
                self.mnemonic = Some(mnemonic);
            }
        }

        if let Ok(key) = std::env::var("FAUCET_PRIVATE_KEY") {
            if !key.trim().is_empty() {
                self.private_key = Some(key);
            }
        }

        if let Ok(amount) = std::env::var("FAUCET_DISPENSE_AMOUNT") {
            self.dispense_amount = amount.parse().unwrap_or(self.dispense_amount);
        }

        if let Ok(hours) = std::env::var("FAUCET_RATE_LIMIT_HOURS") {
            self.rate_limit_hours = hours.parse().unwrap_or(self.rate_limit_hours);
        }

        if let Ok(max_req) = std::env::var("FAUCET_MAX_REQUESTS_PER_MINUTE") {
            self.max_requests_per_minute = max_req.parse().unwrap_or(self.max_requests_per_minute);
        }

        if let Ok(url) = std::env::var("FAUCET_EXPLORER_URL") {
            self.explorer_url = url;
        }

        if let Ok(db_path) = std::env::var("FAUCET_DB_PATH") {
            self.db_path = Some(db_path);
        }

        if let Ok(level) = std::env::var("FAUCET_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("FAUCET_LOG_FORMAT") {
            match format.parse() {
                Ok(format) => self.logging.format = format,
                Err(e) => eprintln!("Ignoring FAUCET_LOG_FORMAT: {}", e),
            }
        }
    }

    /// Whether a dispenser credential is present
    pub fn has_credential(&self) -> bool {
        self.mnemonic.is_some() || self.private_key.is_some()
    }

    /// Cooldown window per address
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_hours * 3600)
    }

    pub fn broadcast_timeout(&self) -> Duration {
        Duration::from_secs(self.broadcast_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }
}
