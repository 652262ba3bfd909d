//! Supported browser wallets

use crate::error::WalletError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wallet variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    Keplr,
    Cosmostation,
    Leap,
}

impl WalletKind {
    /// Every supported wallet, in display order
    pub const ALL: [WalletKind; 3] = [WalletKind::Keplr, WalletKind::Cosmostation, WalletKind::Leap];

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKind::Keplr => "keplr",
            WalletKind::Cosmostation => "cosmostation",
            WalletKind::Leap => "leap",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WalletKind::Keplr => "Keplr",
            WalletKind::Cosmostation => "Cosmostation",
            WalletKind::Leap => "Leap",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            WalletKind::Keplr => "The most popular Cosmos wallet",
            WalletKind::Cosmostation => "Multi-chain wallet with Keplr-compatible provider",
            WalletKind::Leap => "Cosmos-native wallet with Keplr-compatible API",
        }
    }

    /// Dotted path under which the extension injects its provider.
    /// Cosmostation exposes a Keplr-compatible object nested in its own namespace.
    pub fn injection_path(&self) -> &'static str {
        match self {
            WalletKind::Keplr => "keplr",
            WalletKind::Cosmostation => "cosmostation.providers.keplr",
            WalletKind::Leap => "leap",
        }
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WalletKind {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keplr" => Ok(WalletKind::Keplr),
            "cosmostation" => Ok(WalletKind::Cosmostation),
            "leap" => Ok(WalletKind::Leap),
            _ => Err(WalletError::WalletNotInstalled(s.to_string())),
        }
    }
}
