use serde::{Deserialize, Serialize};
use std::fmt;

/// A token amount in base units.
///
/// Amounts travel as decimal strings on the wire, as they do in the Cosmos SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(amount: u128, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.to_string(),
        }
    }

    /// Parse the amount, treating garbage as zero
    pub fn amount_u128(&self) -> u128 {
        self.amount.parse().unwrap_or(0)
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Fee attached to a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdFee {
    pub amount: Vec<Coin>,
    pub gas: u64,
}

impl StdFee {
    pub fn new(amount: u128, denom: impl Into<String>, gas: u64) -> Self {
        Self {
            amount: vec![Coin::new(amount, denom)],
            gas,
        }
    }
}

/// Outcome of a delivered transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResponse {
    pub tx_hash: String,
    pub height: u64,
    pub code: u32,
    pub raw_log: String,
}

impl TxResponse {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Render a base-unit amount in display units, e.g. `5000000` with 6 decimals is `"5"`.
/// Decimals beyond what `u128` can scale leave the raw amount unchanged.
pub fn format_amount(raw: u128, decimals: u32) -> String {
    let unit = match 10u128.checked_pow(decimals) {
        Some(unit) if decimals > 0 => unit,
        _ => return raw.to_string(),
    };
    let whole = raw / unit;
    let frac = raw % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
