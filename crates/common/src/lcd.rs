//! REST (LCD) client for a Capsule node

use crate::error::{ChainError, ChainResult};
use crate::types::TxResponse;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Timeout for individual REST requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// On-chain account numbers needed for signing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

#[derive(Debug, Deserialize)]
struct RawTxResponse {
    #[serde(default)]
    txhash: String,
    #[serde(default)]
    height: String,
    #[serde(default)]
    code: u32,
    #[serde(default)]
    raw_log: String,
}

impl From<RawTxResponse> for TxResponse {
    fn from(raw: RawTxResponse) -> Self {
        Self {
            tx_hash: raw.txhash,
            height: raw.height.parse().unwrap_or(0),
            code: raw.code,
            raw_log: raw.raw_log,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TxEnvelope {
    tx_response: Option<RawTxResponse>,
}

#[derive(Clone)]
pub struct LcdClient {
    base_url: String,
    client: reqwest::Client,
}

impl LcdClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str) -> ChainResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }

    async fn post(&self, path: &str, payload: &Value) -> ChainResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(payload).send().await?;
        Self::read_json(response).await
    }

    async fn read_json(response: reqwest::Response) -> ChainResult<Value> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::NotFound(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // the gRPC gateway reports missing objects as code 5 with a 400/500 status
            if body.contains("not found") {
                return Err(ChainError::NotFound(body));
            }
            return Err(ChainError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ChainError::Decode(format!("Invalid response: {}", e)))
    }

    /// Balance of `address` in `denom`, base units
    pub async fn balance(&self, address: &str, denom: &str) -> ChainResult<u128> {
        let json = self
            .get(&format!(
                "/cosmos/bank/v1beta1/balances/{}/by_denom?denom={}",
                address, denom
            ))
            .await?;

        let amount = json
            .pointer("/balance/amount")
            .and_then(Value::as_str)
            .unwrap_or("0");

        amount
            .parse::<u128>()
            .map_err(|e| ChainError::Decode(format!("Invalid balance amount {}: {}", amount, e)))
    }

    pub async fn account(&self, address: &str) -> ChainResult<AccountInfo> {
        let json = self
            .get(&format!("/cosmos/auth/v1beta1/accounts/{}", address))
            .await?;

        let account = json
            .get("account")
            .ok_or_else(|| ChainError::Decode("Missing account field".to_string()))?;
        // vesting and module accounts nest the base account
        let base = account.get("base_account").unwrap_or(account);

        Ok(AccountInfo {
            account_number: parse_u64_field(base, "account_number")?,
            sequence: parse_u64_field(base, "sequence")?,
        })
    }

    /// Network (chain id) reported by the node
    pub async fn node_network(&self) -> ChainResult<String> {
        let json = self
            .get("/cosmos/base/tendermint/v1beta1/node_info")
            .await?;

        json.pointer("/default_node_info/network")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ChainError::Decode("Missing network in node info".to_string()))
    }

    /// Submit with `BROADCAST_MODE_SYNC`; the returned code is the CheckTx result
    pub async fn broadcast_tx_sync(&self, tx_bytes: &[u8]) -> ChainResult<TxResponse> {
        let payload = serde_json::json!({
            "tx_bytes": base64::engine::general_purpose::STANDARD.encode(tx_bytes),
            "mode": "BROADCAST_MODE_SYNC",
        });

        let json = self.post("/cosmos/tx/v1beta1/txs", &payload).await?;
        let envelope: TxEnvelope = serde_json::from_value(json)
            .map_err(|e| ChainError::Decode(format!("Invalid broadcast response: {}", e)))?;

        envelope
            .tx_response
            .map(TxResponse::from)
            .ok_or_else(|| ChainError::Decode("Missing tx_response".to_string()))
    }

    /// Look up a delivered transaction; `None` while it is not yet in a block
    pub async fn get_tx(&self, hash: &str) -> ChainResult<Option<TxResponse>> {
        match self.get(&format!("/cosmos/tx/v1beta1/txs/{}", hash)).await {
            Ok(json) => {
                let envelope: TxEnvelope = serde_json::from_value(json)
                    .map_err(|e| ChainError::Decode(format!("Invalid tx response: {}", e)))?;
                Ok(envelope.tx_response.map(TxResponse::from))
            }
            Err(ChainError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Poll until the transaction lands in a block or `timeout` elapses
    pub async fn wait_for_tx(
        &self,
        hash: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> ChainResult<TxResponse> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.get_tx(hash).await {
                Ok(Some(response)) => return Ok(response),
                Ok(None) => debug!("Transaction {} not yet included", hash),
                Err(e) if e.is_transport() => warn!("Polling for {} failed: {}", hash, e),
                Err(e) => return Err(e),
            }

            if Instant::now() + poll_interval > deadline {
                return Err(ChainError::Timeout(hash.to_string()));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

fn parse_u64_field(value: &Value, field: &str) -> ChainResult<u64> {
    match value.get(field) {
        Some(Value::String(s)) => s
            .parse()
            .map_err(|e| ChainError::Decode(format!("Invalid {}: {}", field, e))),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| ChainError::Decode(format!("Invalid {}", field))),
        // proto3 JSON omits zero values
        None => Ok(0),
        Some(other) => Err(ChainError::Decode(format!("Invalid {}: {}", field, other))),
    }
}
