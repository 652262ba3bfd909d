//! Bech32 account addresses

use crate::error::{ChainError, ChainResult};
use bech32::{Bech32, Hrp};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Data characters after `<prefix>1` accepted by the faucet format check
pub const DEFAULT_ADDRESS_BODY_LEN: usize = 39;

/// Cheap shape check: `^<prefix>1[0-9a-z]{body_len}$`.
///
/// No checksum verification; callers that need a decodable address use [`decode`].
pub fn matches_format(address: &str, prefix: &str, body_len: usize) -> bool {
    let Some(body) = address
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('1'))
    else {
        return false;
    };

    body.len() == body_len
        && body
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

/// Account address bytes for a compressed secp256k1 public key
pub fn account_id(pubkey: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(pubkey);
    let rip = Ripemd160::digest(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&rip);
    out
}

pub fn encode(prefix: &str, data: &[u8]) -> ChainResult<String> {
    let hrp = Hrp::parse(prefix).map_err(|e| ChainError::InvalidAddress(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, data).map_err(|e| ChainError::InvalidAddress(e.to_string()))
}

/// Decode and check the human readable part
pub fn decode(address: &str, expected_prefix: &str) -> ChainResult<Vec<u8>> {
    let (hrp, data) =
        bech32::decode(address).map_err(|e| ChainError::InvalidAddress(e.to_string()))?;
    if hrp.as_str() != expected_prefix {
        return Err(ChainError::InvalidAddress(format!(
            "expected prefix {}, got {}",
            expected_prefix,
            hrp.as_str()
        )));
    }
    Ok(data)
}

/// Bech32 address of a compressed secp256k1 public key
pub fn from_pubkey(prefix: &str, pubkey: &[u8]) -> ChainResult<String> {
    encode(prefix, &account_id(pubkey))
}
