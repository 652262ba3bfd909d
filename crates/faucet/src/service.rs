//! Faucet service core logic

use crate::chain::{CosmosDispenser, Dispenser};
use crate::config::FaucetConfig;
use crate::database::SledRateLimitStore;
use crate::error::{FaucetError, FaucetResult};
use crate::metrics::FaucetMetrics;
use crate::rate_limit::{self, MemoryRateLimitStore, RateLimitStore};
use capsule_common::types::format_amount;
use capsule_common::{address, ChainError, Coin, StdFee};
use chrono::{DateTime, Utc};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Process-wide throughput guard
type RateLimiterImpl = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Successful dispense, returned to the caller and not stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispenseResult {
    /// Display units
    pub amount: String,
    /// Base units
    pub amount_raw: String,
    pub denom: String,
    pub tx_hash: String,
    pub height: u64,
    pub explorer_url: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetails {
    pub address: String,
    pub balance: String,
    pub balance_raw: String,
    pub denom: String,
    pub amount_per_request: String,
    pub remaining_requests: u64,
    pub rate_limit_hours: u64,
}

/// Faucet status; serializes to `{"configured": false}` when no credential is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaucetStatus {
    pub configured: bool,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub details: Option<StatusDetails>,
}

pub struct FaucetService {
    config: FaucetConfig,
    dispenser: Option<Arc<dyn Dispenser>>,
    store: Arc<dyn RateLimitStore>,
    throttle: RateLimiterImpl,
    metrics: FaucetMetrics,
}

impl FaucetService {
    pub fn new(
        config: FaucetConfig,
        dispenser: Option<Arc<dyn Dispenser>>,
        store: Arc<dyn RateLimitStore>,
    ) -> FaucetResult<Self> {
        let per_minute = NonZeroU32::new(config.max_requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let throttle = RateLimiter::direct(Quota::per_minute(per_minute));
        let metrics = FaucetMetrics::new().map_err(|e| FaucetError::Internal(e.to_string()))?;

        if dispenser.is_none() {
            warn!("No faucet credential configured; dispense requests will be refused");
        }

        Ok(Self {
            config,
            dispenser,
            store,
            throttle,
            metrics,
        })
    }

    /// Wire up the node client and the rate-limit store described by `config`
    pub fn from_config(config: FaucetConfig) -> FaucetResult<Self> {
        let dispenser = CosmosDispenser::from_config(&config)
            .map_err(|e| FaucetError::ServiceUnavailable(e.to_string()))?
            .map(|d| Arc::new(d) as Arc<dyn Dispenser>);

        let store: Arc<dyn RateLimitStore> = match &config.db_path {
            Some(path) => Arc::new(SledRateLimitStore::open(path)?),
            None => Arc::new(MemoryRateLimitStore::new()),
        };

        Self::new(config, dispenser, store)
    }

    pub fn config(&self) -> &FaucetConfig {
        &self.config
    }

    pub fn metrics(&self) -> &FaucetMetrics {
        &self.metrics
    }

    /// Dispense tokens to an address
    pub async fn dispense(&self, address: &str) -> FaucetResult<DispenseResult> {
        self.dispense_at(address, Utc::now()).await
    }

    /// [`dispense`](Self::dispense) evaluated at a given instant
    pub async fn dispense_at(
        &self,
        address: &str,
        now: DateTime<Utc>,
    ) -> FaucetResult<DispenseResult> {
        let address = address.trim();
        info!("Dispense request for address: {}", address);

        let result = self.run_dispense(address, now).await;
        match &result {
            Ok(dispensed) => {
                self.metrics.record_outcome("success");
                self.metrics.dispensed_total.inc_by(self.config.dispense_amount);
                info!("Successfully dispensed to {}, tx: {}", address, dispensed.tx_hash);
            }
            Err(e) => {
                self.metrics.record_outcome(e.code());
                if e.status_code().is_server_error() {
                    error!("Dispense to {} failed: {}", address, e);
                } else {
                    debug!("Dispense to {} refused: {}", address, e);
                }
            }
        }
        result
    }

    async fn run_dispense(&self, address: &str, now: DateTime<Utc>) -> FaucetResult<DispenseResult> {
        // 1. Validate address
        self.validate_address(address)?;

        self.throttle
            .check()
            .map_err(|_| FaucetError::RateLimited { retry_after_hours: 1 })?;

        // 2. Check address cooldown
        self.check_cooldown(address, now).await?;

        // 3. Dispenser must be configured
        let dispenser = self.dispenser.as_ref().ok_or_else(|| {
            FaucetError::ServiceUnavailable("Faucet credential not configured".to_string())
        })?;

        // 4. Check faucet balance
        self.check_faucet_balance(dispenser.as_ref()).await?;

        // 5. Only unfunded accounts are served
        self.check_recipient_unfunded(dispenser.as_ref(), address).await?;

        // 6. Create and send transaction
        let amount = [Coin::new(self.config.dispense_amount as u128, &self.config.denom)];
        let fee = StdFee::new(
            self.config.fee_amount as u128,
            &self.config.denom,
            self.config.gas_limit,
        );

        let tx = dispenser
            .send_tokens(address, &amount, &fee, &self.config.memo)
            .await
            .map_err(|e| match e {
                ChainError::Broadcast { raw_log, .. } => FaucetError::TransactionFailed(raw_log),
                other => FaucetError::Chain(other),
            })?;

        if !tx.is_success() {
            return Err(FaucetError::TransactionFailed(tx.raw_log));
        }

        // 7. Record distribution
        self.record(address, now).await;

        let display = format_amount(self.config.dispense_amount as u128, self.config.decimals);
        Ok(DispenseResult {
            message: format!(
                "Successfully sent {} {} to {}",
                display, self.config.display_denom, address
            ),
            amount: display,
            amount_raw: self.config.dispense_amount.to_string(),
            denom: self.config.display_denom.clone(),
            explorer_url: self.config.explorer_tx_url(&tx.tx_hash),
            tx_hash: tx.tx_hash,
            height: tx.height,
        })
    }

    /// Validate address format
    fn validate_address(&self, address: &str) -> FaucetResult<()> {
        if !address::matches_format(
            address,
            &self.config.address_prefix,
            self.config.address_body_len,
        ) {
            return Err(FaucetError::InvalidAddress(address.to_string()));
        }
        Ok(())
    }

    /// Check address cooldown
    async fn check_cooldown(&self, address: &str, now: DateTime<Utc>) -> FaucetResult<()> {
        if let Some(last) = self.store.get(address).await? {
            if let Some(hours) =
                rate_limit::hours_remaining(last, now, self.config.rate_limit_window())
            {
                debug!("Address {} requested too soon. Remaining: {}h", address, hours);
                return Err(FaucetError::RateLimited {
                    retry_after_hours: hours,
                });
            }
        }
        Ok(())
    }

    /// Check faucet balance
    async fn check_faucet_balance(&self, dispenser: &dyn Dispenser) -> FaucetResult<()> {
        let balance = dispenser
            .balance(dispenser.address(), &self.config.denom)
            .await?;
        self.metrics.observe_balance(balance);

        if balance < self.config.dispense_amount as u128 {
            warn!("Faucet balance low: {}{}", balance, self.config.denom);
            return Err(FaucetError::InsufficientFunds);
        }

        debug!("Faucet balance: {}{}", balance, self.config.denom);
        Ok(())
    }

    async fn check_recipient_unfunded(
        &self,
        dispenser: &dyn Dispenser,
        address: &str,
    ) -> FaucetResult<()> {
        // accounts unknown to the chain cannot be queried yet; count them as empty
        let balance = match dispenser.balance(address, &self.config.denom).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!("Balance lookup for {} failed, treating as zero: {}", address, e);
                0
            }
        };

        if balance > 0 {
            return Err(FaucetError::AlreadyFunded);
        }
        Ok(())
    }

    async fn record(&self, address: &str, now: DateTime<Utc>) {
        if let Err(e) = self
            .store
            .set(address, now, self.config.rate_limit_window())
            .await
        {
            error!("Failed to record dispense for {}: {}", address, e);
        }

        match self.store.evict_expired(now).await {
            Ok(0) => {}
            Ok(removed) => debug!("Cleaned up {} expired rate-limit entries", removed),
            Err(e) => warn!("Rate-limit cleanup failed: {}", e),
        }
    }

    /// Get faucet status
    pub async fn get_status(&self) -> FaucetResult<FaucetStatus> {
        let Some(dispenser) = &self.dispenser else {
            return Ok(FaucetStatus {
                configured: false,
                details: None,
            });
        };

        let balance = dispenser
            .balance(dispenser.address(), &self.config.denom)
            .await?;
        self.metrics.observe_balance(balance);

        let per_request = self.config.dispense_amount as u128;
        let remaining = if per_request == 0 { 0 } else { balance / per_request };

        Ok(FaucetStatus {
            configured: true,
            details: Some(StatusDetails {
                address: dispenser.address().to_string(),
                balance: format_amount(balance, self.config.decimals),
                balance_raw: balance.to_string(),
                denom: self.config.display_denom.clone(),
                amount_per_request: format_amount(per_request, self.config.decimals),
                remaining_requests: u64::try_from(remaining).unwrap_or(u64::MAX),
                rate_limit_hours: self.config.rate_limit_hours,
            }),
        })
    }
}
