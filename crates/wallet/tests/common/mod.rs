#![allow(dead_code)]

use async_trait::async_trait;
use capsule_common::tx::{SignDoc, SigningKey};
use capsule_common::{ChainError, ChainInfo, ChainResult};
use capsule_wallet::{
    AccountData, ChainQueryClient, ClientConnector, ExtensionError, ExtensionHost, OfflineSigner,
    WalletExtension, WalletKind,
};
use prost::Message;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn test_chain() -> ChainInfo {
    ChainInfo::capsule_testnet("http://127.0.0.1:26657", "http://127.0.0.1:1317")
}

/// Key-backed signer whose reported accounts can be swapped mid-test
pub struct MockSigner {
    key: SigningKey,
    pub accounts: Mutex<Vec<AccountData>>,
    pub fail: AtomicBool,
}

impl MockSigner {
    pub fn new(seed: u8) -> Self {
        let key = SigningKey::from_hex(&hex_seed(seed)).unwrap();
        let account = AccountData {
            address: key.address("cosmos").unwrap(),
            algo: "secp256k1".to_string(),
            pubkey: key.public_key(),
        };
        Self {
            key,
            accounts: Mutex::new(vec![account]),
            fail: AtomicBool::new(false),
        }
    }

    pub fn empty() -> Self {
        let signer = Self::new(1);
        signer.accounts.lock().unwrap().clear();
        signer
    }

    pub fn address(&self) -> String {
        self.key.address("cosmos").unwrap()
    }

    pub fn public_key(&self) -> Vec<u8> {
        self.key.public_key()
    }
}

fn hex_seed(seed: u8) -> String {
    format!("{:02x}", seed).repeat(32)
}

#[async_trait]
impl OfflineSigner for MockSigner {
    async fn get_accounts(&self) -> Result<Vec<AccountData>, ExtensionError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExtensionError::Failed("extension locked".to_string()));
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn sign_direct(
        &self,
        signer_address: &str,
        sign_doc: &SignDoc,
    ) -> Result<Vec<u8>, ExtensionError> {
        if signer_address != self.address() {
            return Err(ExtensionError::Failed(format!("unknown signer {}", signer_address)));
        }
        Ok(self.key.sign(&sign_doc.encode_to_vec()))
    }
}

/// Keplr-compatible extension that counts every prompt
pub struct MockExtension {
    pub signer: Arc<MockSigner>,
    pub reject_suggest: AtomicBool,
    pub reject_enable: AtomicBool,
    pub enable_delay: Mutex<Duration>,
    pub suggest_calls: AtomicUsize,
    pub enable_calls: AtomicUsize,
    pub suggested_chain: Mutex<Option<String>>,
}

impl MockExtension {
    pub fn new(signer: Arc<MockSigner>) -> Self {
        Self {
            signer,
            reject_suggest: AtomicBool::new(false),
            reject_enable: AtomicBool::new(false),
            enable_delay: Mutex::new(Duration::ZERO),
            suggest_calls: AtomicUsize::new(0),
            enable_calls: AtomicUsize::new(0),
            suggested_chain: Mutex::new(None),
        }
    }

    pub fn enable_calls(&self) -> usize {
        self.enable_calls.load(Ordering::SeqCst)
    }

    pub fn suggest_calls(&self) -> usize {
        self.suggest_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletExtension for MockExtension {
    async fn experimental_suggest_chain(&self, chain: &ChainInfo) -> Result<(), ExtensionError> {
        self.suggest_calls.fetch_add(1, Ordering::SeqCst);
        *self.suggested_chain.lock().unwrap() = Some(chain.chain_id.clone());
        if self.reject_suggest.load(Ordering::SeqCst) {
            return Err(ExtensionError::Rejected("chain not added".to_string()));
        }
        Ok(())
    }

    async fn enable(&self, _chain_id: &str) -> Result<(), ExtensionError> {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.enable_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.reject_enable.load(Ordering::SeqCst) {
            return Err(ExtensionError::Rejected("user closed the popup".to_string()));
        }
        Ok(())
    }

    async fn get_offline_signer(
        &self,
        _chain_id: &str,
    ) -> Result<Arc<dyn OfflineSigner>, ExtensionError> {
        Ok(self.signer.clone())
    }
}

/// Injection environment keyed by dotted path
#[derive(Default)]
pub struct MockHost {
    extensions: Mutex<HashMap<String, Arc<MockExtension>>>,
    pub lookups: AtomicUsize,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, kind: WalletKind, extension: Arc<MockExtension>) {
        self.extensions
            .lock()
            .unwrap()
            .insert(kind.injection_path().to_string(), extension);
    }

    pub fn uninstall(&self, kind: WalletKind) {
        self.extensions.lock().unwrap().remove(kind.injection_path());
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ExtensionHost for MockHost {
    fn lookup(&self, path: &str) -> Option<Arc<dyn WalletExtension>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.extensions
            .lock()
            .unwrap()
            .get(path)
            .map(|ext| ext.clone() as Arc<dyn WalletExtension>)
    }
}

/// Query client with a settable balance and an offline switch
pub struct MockQueryClient {
    pub balance: Mutex<u128>,
    pub offline: AtomicBool,
}

#[async_trait]
impl ChainQueryClient for MockQueryClient {
    async fn balance(&self, _address: &str, _denom: &str) -> ChainResult<u128> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ChainError::Timeout("balance query".to_string()));
        }
        Ok(*self.balance.lock().unwrap())
    }
}

pub struct MockConnector {
    pub client: Arc<MockQueryClient>,
    pub reachable: AtomicBool,
    pub connects: AtomicUsize,
}

impl MockConnector {
    pub fn new(balance: u128) -> Self {
        Self {
            client: Arc::new(MockQueryClient {
                balance: Mutex::new(balance),
                offline: AtomicBool::new(false),
            }),
            reachable: AtomicBool::new(true),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        let connector = Self::new(0);
        connector.reachable.store(false, Ordering::SeqCst);
        connector
    }
}

#[async_trait]
impl ClientConnector for MockConnector {
    async fn connect(&self, chain: &ChainInfo) -> ChainResult<Arc<dyn ChainQueryClient>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(ChainError::Timeout(format!("connect {}", chain.rest)));
        }
        Ok(self.client.clone())
    }
}
