#![allow(dead_code)]

use async_trait::async_trait;
use capsule_common::{ChainError, ChainResult, Coin, StdFee, TxResponse};
use capsule_faucet::{Dispenser, FaucetConfig};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const DISPENSER_ADDRESS: &str = "cosmos1dispenser";

pub fn fresh_address(fill: char) -> String {
    format!("cosmos1{}", fill.to_string().repeat(39))
}

pub fn test_config() -> FaucetConfig {
    FaucetConfig {
        private_key: Some("01".repeat(32)),
        ..Default::default()
    }
}

/// In-memory stand-in for the node, counting every call
pub struct MockDispenser {
    pub dispenser_balance: Mutex<u128>,
    pub balances: Mutex<HashMap<String, u128>>,
    /// Recipients whose lookup fails as if the account did not exist
    pub unknown_accounts: Mutex<Vec<String>>,
    pub delivered: Mutex<TxResponse>,
    pub reject_broadcast: Mutex<Option<String>>,
    pub balance_calls: AtomicUsize,
    pub sends: AtomicUsize,
    pub last_send: Mutex<Option<(String, Vec<Coin>, StdFee, String)>>,
}

impl MockDispenser {
    pub fn with_balance(balance: u128) -> Self {
        Self {
            dispenser_balance: Mutex::new(balance),
            balances: Mutex::new(HashMap::new()),
            unknown_accounts: Mutex::new(Vec::new()),
            delivered: Mutex::new(TxResponse {
                tx_hash: "A1B2C3".to_string(),
                height: 1234,
                code: 0,
                raw_log: String::new(),
            }),
            reject_broadcast: Mutex::new(None),
            balance_calls: AtomicUsize::new(0),
            sends: AtomicUsize::new(0),
            last_send: Mutex::new(None),
        }
    }

    pub fn fund(&self, address: &str, amount: u128) {
        self.balances.lock().unwrap().insert(address.to_string(), amount);
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dispenser for MockDispenser {
    fn address(&self) -> &str {
        DISPENSER_ADDRESS
    }

    async fn balance(&self, address: &str, _denom: &str) -> ChainResult<u128> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);

        if address == DISPENSER_ADDRESS {
            return Ok(*self.dispenser_balance.lock().unwrap());
        }
        if self.unknown_accounts.lock().unwrap().iter().any(|a| a == address) {
            return Err(ChainError::NotFound(format!("account {} not found", address)));
        }
        Ok(self.balances.lock().unwrap().get(address).copied().unwrap_or(0))
    }

    async fn send_tokens(
        &self,
        recipient: &str,
        amount: &[Coin],
        fee: &StdFee,
        memo: &str,
    ) -> ChainResult<TxResponse> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        *self.last_send.lock().unwrap() = Some((
            recipient.to_string(),
            amount.to_vec(),
            fee.clone(),
            memo.to_string(),
        ));

        if let Some(raw_log) = self.reject_broadcast.lock().unwrap().clone() {
            return Err(ChainError::Broadcast { code: 13, raw_log });
        }
        Ok(self.delivered.lock().unwrap().clone())
    }
}
