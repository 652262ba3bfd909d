//! Chain descriptor for Capsule Network.
//!
//! The same structure is handed to wallet extensions during the suggest-chain
//! handshake, so it serializes in the camelCase layout those extensions expect.

use serde::{Deserialize, Serialize};

pub const DEFAULT_CHAIN_ID: &str = "capsule-testnet-1";
pub const DEFAULT_BECH32_PREFIX: &str = "cosmos";
pub const DEFAULT_BASE_DENOM: &str = "ucaps";
pub const DEFAULT_DISPLAY_DENOM: &str = "CAPS";
pub const DEFAULT_DECIMALS: u32 = 6;
pub const COSMOS_COIN_TYPE: u32 = 118;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bip44 {
    pub coin_type: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bech32Config {
    pub bech32_prefix_acc_addr: String,
    pub bech32_prefix_acc_pub: String,
    pub bech32_prefix_val_addr: String,
    pub bech32_prefix_val_pub: String,
    pub bech32_prefix_cons_addr: String,
    pub bech32_prefix_cons_pub: String,
}

impl Bech32Config {
    /// Derive the six standard prefixes from the account prefix
    pub fn from_prefix(prefix: &str) -> Self {
        Self {
            bech32_prefix_acc_addr: prefix.to_string(),
            bech32_prefix_acc_pub: format!("{prefix}pub"),
            bech32_prefix_val_addr: format!("{prefix}valoper"),
            bech32_prefix_val_pub: format!("{prefix}valoperpub"),
            bech32_prefix_cons_addr: format!("{prefix}valcons"),
            bech32_prefix_cons_pub: format!("{prefix}valconspub"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub coin_denom: String,
    pub coin_minimal_denom: String,
    pub coin_decimals: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPriceStep {
    pub low: f64,
    pub average: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeCurrency {
    #[serde(flatten)]
    pub currency: Currency,
    pub gas_price_step: GasPriceStep,
}

/// Everything a wallet needs to recognise the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub chain_id: String,
    pub chain_name: String,
    pub rpc: String,
    pub rest: String,
    pub bip44: Bip44,
    pub bech32_config: Bech32Config,
    pub currencies: Vec<Currency>,
    pub fee_currencies: Vec<FeeCurrency>,
    pub stake_currency: Currency,
    pub features: Vec<String>,
}

impl ChainInfo {
    /// Capsule public testnet
    pub fn capsule_testnet(rpc: impl Into<String>, rest: impl Into<String>) -> Self {
        let caps = Currency {
            coin_denom: DEFAULT_DISPLAY_DENOM.to_string(),
            coin_minimal_denom: DEFAULT_BASE_DENOM.to_string(),
            coin_decimals: DEFAULT_DECIMALS,
        };

        Self {
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            chain_name: "Capsule Network Testnet".to_string(),
            rpc: rpc.into(),
            rest: rest.into(),
            bip44: Bip44 {
                coin_type: COSMOS_COIN_TYPE,
            },
            bech32_config: Bech32Config::from_prefix(DEFAULT_BECH32_PREFIX),
            currencies: vec![caps.clone()],
            fee_currencies: vec![FeeCurrency {
                currency: caps.clone(),
                gas_price_step: GasPriceStep {
                    low: 0.01,
                    average: 0.025,
                    high: 0.04,
                },
            }],
            stake_currency: caps,
            features: vec!["cosmwasm".to_string(), "ibc-transfer".to_string()],
        }
    }

    pub fn bech32_prefix(&self) -> &str {
        &self.bech32_config.bech32_prefix_acc_addr
    }

    pub fn staking_denom(&self) -> &str {
        &self.stake_currency.coin_minimal_denom
    }
}

impl Default for ChainInfo {
    fn default() -> Self {
        Self::capsule_testnet("http://localhost:26657", "http://localhost:1317")
    }
}
