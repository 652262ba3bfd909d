//! Dispensing account and its blockchain client

use crate::config::FaucetConfig;
use async_trait::async_trait;
use capsule_common::lcd::LcdClient;
use capsule_common::tx::{self, SendParams, SigningKey};
use capsule_common::{ChainError, ChainResult, Coin, StdFee, TxResponse};
use std::time::Duration;
use tracing::{debug, info};

/// Signing client owned by the faucet
#[async_trait]
pub trait Dispenser: Send + Sync {
    /// Bech32 address of the dispensing account
    fn address(&self) -> &str;

    async fn balance(&self, address: &str, denom: &str) -> ChainResult<u128>;

    /// Sign, broadcast and wait for a bank transfer.
    ///
    /// A delivered transaction with a non-zero code is returned as `Ok`; the
    /// caller decides what a failed code means.
    async fn send_tokens(
        &self,
        recipient: &str,
        amount: &[Coin],
        fee: &StdFee,
        memo: &str,
    ) -> ChainResult<TxResponse>;
}

/// [`Dispenser`] backed by a node's REST endpoint
pub struct CosmosDispenser {
    key: SigningKey,
    address: String,
    chain_id: String,
    lcd: LcdClient,
    broadcast_timeout: Duration,
    poll_interval: Duration,
}

impl CosmosDispenser {
    pub fn new(key: SigningKey, config: &FaucetConfig) -> ChainResult<Self> {
        let address = key.address(&config.address_prefix)?;
        info!("Faucet address: {}", address);

        Ok(Self {
            key,
            address,
            chain_id: config.chain_id.clone(),
            lcd: LcdClient::new(config.rest_url.clone()),
            broadcast_timeout: config.broadcast_timeout(),
            poll_interval: config.poll_interval(),
        })
    }

    /// Build from the configured credential; `Ok(None)` when none is set
    pub fn from_config(config: &FaucetConfig) -> ChainResult<Option<Self>> {
        let key = match (&config.mnemonic, &config.private_key) {
            (Some(mnemonic), _) => SigningKey::from_mnemonic(mnemonic)?,
            (None, Some(hex_key)) => SigningKey::from_hex(hex_key)?,
            (None, None) => return Ok(None),
        };
        Self::new(key, config).map(Some)
    }
}

#[async_trait]
impl Dispenser for CosmosDispenser {
    fn address(&self) -> &str {
        &self.address
    }

    async fn balance(&self, address: &str, denom: &str) -> ChainResult<u128> {
        self.lcd.balance(address, denom).await
    }

    async fn send_tokens(
        &self,
        recipient: &str,
        amount: &[Coin],
        fee: &StdFee,
        memo: &str,
    ) -> ChainResult<TxResponse> {
        let account = self.lcd.account(&self.address).await?;
        debug!(
            "Signing transfer with account_number={} sequence={}",
            account.account_number, account.sequence
        );

        let tx_bytes = tx::build_send_tx(
            &self.key,
            &SendParams {
                chain_id: &self.chain_id,
                account_number: account.account_number,
                sequence: account.sequence,
                from: &self.address,
                to: recipient,
                amount,
                fee,
                memo,
            },
        );

        let checked = self.lcd.broadcast_tx_sync(&tx_bytes).await?;
        if !checked.is_success() {
            return Err(ChainError::Broadcast {
                code: checked.code,
                raw_log: checked.raw_log,
            });
        }

        let hash = if checked.tx_hash.is_empty() {
            tx::tx_hash(&tx_bytes)
        } else {
            checked.tx_hash
        };
        info!("Transaction broadcast: {}", hash);

        self.lcd
            .wait_for_tx(&hash, self.broadcast_timeout, self.poll_interval)
            .await
    }
}
