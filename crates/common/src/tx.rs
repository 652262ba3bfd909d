//! Bank transfer construction and SIGN_MODE_DIRECT signing.
//!
//! Only the handful of Cosmos SDK protobuf messages needed for a `MsgSend`
//! are declared here; field tags follow `cosmos.tx.v1beta1`.

use crate::address;
use crate::error::{ChainError, ChainResult};
use crate::types::{Coin, StdFee};
use k256::ecdsa::{signature::Signer, Signature};
use prost::Message;
use sha2::{Digest, Sha256};

/// Standard Cosmos HD path (coin type 118)
pub const COSMOS_HD_PATH: &str = "m/44'/118'/0'/0/0";

const MSG_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";
const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";
const SIGN_MODE_DIRECT: i32 = 1;

#[derive(Clone, PartialEq, Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoCoin {
    #[prost(string, tag = "1")]
    pub denom: String,
    #[prost(string, tag = "2")]
    pub amount: String,
}

impl From<&Coin> for ProtoCoin {
    fn from(coin: &Coin) -> Self {
        Self {
            denom: coin.denom.clone(),
            amount: coin.amount.clone(),
        }
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct MsgSend {
    #[prost(string, tag = "1")]
    pub from_address: String,
    #[prost(string, tag = "2")]
    pub to_address: String,
    #[prost(message, repeated, tag = "3")]
    pub amount: Vec<ProtoCoin>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TxBody {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Any>,
    #[prost(string, tag = "2")]
    pub memo: String,
    #[prost(uint64, tag = "3")]
    pub timeout_height: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct PubKey {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Single {
    #[prost(int32, tag = "1")]
    pub mode: i32,
}

/// `ModeInfo` is a oneof upstream; only the `single` arm is ever produced here.
#[derive(Clone, PartialEq, Message)]
pub struct ModeInfo {
    #[prost(message, optional, tag = "1")]
    pub single: Option<Single>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignerInfo {
    #[prost(message, optional, tag = "1")]
    pub public_key: Option<Any>,
    #[prost(message, optional, tag = "2")]
    pub mode_info: Option<ModeInfo>,
    #[prost(uint64, tag = "3")]
    pub sequence: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct Fee {
    #[prost(message, repeated, tag = "1")]
    pub amount: Vec<ProtoCoin>,
    #[prost(uint64, tag = "2")]
    pub gas_limit: u64,
    #[prost(string, tag = "3")]
    pub payer: String,
    #[prost(string, tag = "4")]
    pub granter: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct AuthInfo {
    #[prost(message, repeated, tag = "1")]
    pub signer_infos: Vec<SignerInfo>,
    #[prost(message, optional, tag = "2")]
    pub fee: Option<Fee>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignDoc {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(string, tag = "3")]
    pub chain_id: String,
    #[prost(uint64, tag = "4")]
    pub account_number: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct TxRaw {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub signatures: Vec<Vec<u8>>,
}

/// secp256k1 account key
pub struct SigningKey {
    inner: k256::ecdsa::SigningKey,
}

impl SigningKey {
    /// Derive from a BIP39 phrase along [`COSMOS_HD_PATH`]
    pub fn from_mnemonic(phrase: &str) -> ChainResult<Self> {
        let mnemonic = bip39::Mnemonic::parse(phrase.trim())
            .map_err(|e| ChainError::InvalidKey(format!("Invalid mnemonic: {}", e)))?;
        let seed = mnemonic.to_seed("");

        let path: bip32::DerivationPath = COSMOS_HD_PATH
            .parse()
            .map_err(|e| ChainError::InvalidKey(format!("Invalid derivation path: {}", e)))?;
        let xprv = bip32::XPrv::derive_from_path(seed, &path)
            .map_err(|e| ChainError::InvalidKey(format!("Derivation failed: {}", e)))?;

        Ok(Self {
            inner: xprv.private_key().clone(),
        })
    }

    /// Raw 32-byte key, hex encoded, with or without `0x`
    pub fn from_hex(hex_key: &str) -> ChainResult<Self> {
        let trimmed = hex_key.trim();
        let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(stripped)
            .map_err(|e| ChainError::InvalidKey(format!("Invalid private key: {}", e)))?;
        let inner = k256::ecdsa::SigningKey::from_slice(&bytes)
            .map_err(|e| ChainError::InvalidKey(format!("Invalid signing key: {}", e)))?;
        Ok(Self { inner })
    }

    /// Compressed SEC1 public key (33 bytes)
    pub fn public_key(&self) -> Vec<u8> {
        self.inner
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    pub fn address(&self, prefix: &str) -> ChainResult<String> {
        address::from_pubkey(prefix, &self.public_key())
    }

    /// 64-byte `r || s` over SHA-256 of `msg`, low-S normalized
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        let signature: Signature = self.inner.sign(msg);
        signature.to_bytes().to_vec()
    }
}

/// Parameters of a single-message bank transfer
pub struct SendParams<'a> {
    pub chain_id: &'a str,
    pub account_number: u64,
    pub sequence: u64,
    pub from: &'a str,
    pub to: &'a str,
    pub amount: &'a [Coin],
    pub fee: &'a StdFee,
    pub memo: &'a str,
}

/// Build, sign and serialize a `TxRaw` carrying one `MsgSend`
pub fn build_send_tx(key: &SigningKey, params: &SendParams<'_>) -> Vec<u8> {
    let msg = MsgSend {
        from_address: params.from.to_string(),
        to_address: params.to.to_string(),
        amount: params.amount.iter().map(ProtoCoin::from).collect(),
    };

    let body = TxBody {
        messages: vec![Any {
            type_url: MSG_SEND_TYPE_URL.to_string(),
            value: msg.encode_to_vec(),
        }],
        memo: params.memo.to_string(),
        timeout_height: 0,
    };

    let auth_info = AuthInfo {
        signer_infos: vec![SignerInfo {
            public_key: Some(Any {
                type_url: SECP256K1_PUBKEY_TYPE_URL.to_string(),
                value: PubKey {
                    key: key.public_key(),
                }
                .encode_to_vec(),
            }),
            mode_info: Some(ModeInfo {
                single: Some(Single {
                    mode: SIGN_MODE_DIRECT,
                }),
            }),
            sequence: params.sequence,
        }],
        fee: Some(Fee {
            amount: params.fee.amount.iter().map(ProtoCoin::from).collect(),
            gas_limit: params.fee.gas,
            payer: String::new(),
            granter: String::new(),
        }),
    };

    let body_bytes = body.encode_to_vec();
    let auth_info_bytes = auth_info.encode_to_vec();

    let sign_doc = SignDoc {
        body_bytes: body_bytes.clone(),
        auth_info_bytes: auth_info_bytes.clone(),
        chain_id: params.chain_id.to_string(),
        account_number: params.account_number,
    };
    let signature = key.sign(&sign_doc.encode_to_vec());

    TxRaw {
        body_bytes,
        auth_info_bytes,
        signatures: vec![signature],
    }
    .encode_to_vec()
}

/// Tendermint transaction hash: upper-case hex SHA-256 of the raw bytes
pub fn tx_hash(tx_bytes: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(tx_bytes))
}
