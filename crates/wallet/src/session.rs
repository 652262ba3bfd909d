//! Wallet session state machine
//!
//! Call [`WalletSessionManager::check_connection`] once at startup: it picks up
//! a persisted session and silently reconnects it. After that it doubles as a
//! cheap liveness probe.

use crate::client::{ChainQueryClient, ClientConnector};
use crate::error::{WalletError, WalletResult};
use crate::extension::{provider_for, ExtensionHost, OfflineSigner};
use crate::kind::WalletKind;
use crate::storage::{PersistedSession, SessionStore};
use capsule_common::{ChainInfo, Coin};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// A live, authenticated wallet connection
#[derive(Clone)]
pub struct Session {
    pub address: String,
    pub wallet_type: WalletKind,
    pub signer: Arc<dyn OfflineSigner>,
    /// Absent when the node could not be reached; the session is signer-only
    pub client: Option<Arc<dyn ChainQueryClient>>,
    pub balance: Option<Coin>,
    pub last_connection_check: DateTime<Utc>,
}

impl Session {
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    fn persisted(&self) -> PersistedSession {
        PersistedSession {
            address: self.address.clone(),
            wallet_type: self.wallet_type,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address)
            .field("wallet_type", &self.wallet_type)
            .field("has_client", &self.has_client())
            .field("balance", &self.balance)
            .field("last_connection_check", &self.last_connection_check)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum SessionState {
    Disconnected,
    Connecting { wallet_type: WalletKind },
    Restoring { address: String, wallet_type: WalletKind },
    Authenticated(Session),
}

impl SessionState {
    fn in_flight(&self) -> bool {
        matches!(self, SessionState::Connecting { .. } | SessionState::Restoring { .. })
    }
}

/// Installation status of one supported wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAvailability {
    pub wallet_type: WalletKind,
    pub name: String,
    pub installed: bool,
    pub description: String,
}

pub struct WalletSessionManager {
    chain: ChainInfo,
    host: Arc<dyn ExtensionHost>,
    connector: Arc<dyn ClientConnector>,
    store: Arc<dyn SessionStore>,
    state: RwLock<SessionState>,
    /// Bumped under the state lock by every connect, restore and disconnect.
    /// An attempt only commits if the epoch is still the one it started with.
    epoch: AtomicU64,
}

impl WalletSessionManager {
    pub fn new(
        chain: ChainInfo,
        host: Arc<dyn ExtensionHost>,
        connector: Arc<dyn ClientConnector>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            chain,
            host,
            connector,
            store,
            state: RwLock::new(SessionState::Disconnected),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn chain(&self) -> &ChainInfo {
        &self.chain
    }

    pub fn list_available_wallets(&self) -> Vec<WalletAvailability> {
        WalletKind::ALL
            .iter()
            .map(|kind| provider_for(*kind, self.host.clone()))
            .map(|provider| WalletAvailability {
                wallet_type: provider.kind(),
                name: provider.kind().display_name().to_string(),
                installed: provider.is_installed(),
                description: provider.kind().description().to_string(),
            })
            .collect()
    }

    /// Connect the named wallet and persist the resulting session.
    /// If switching away from a live session fails, that session is kept.
    pub async fn connect(&self, wallet_type: &str) -> WalletResult<Session> {
        let kind: WalletKind = wallet_type.parse()?;

        let (epoch, previous) = {
            let mut state = self.state.write().await;
            if state.in_flight() {
                return Err(WalletError::ConnectionInProgress);
            }
            let previous = match &*state {
                SessionState::Authenticated(session) => Some(session.clone()),
                _ => None,
            };
            *state = SessionState::Connecting { wallet_type: kind };
            (self.next_epoch(), previous)
        };

        info!("Connecting {} wallet", kind.display_name());

        let result = self.establish(kind).await;
        let mut state = self.state.write().await;
        if !self.is_current(epoch) {
            debug!("Connection to {} superseded by disconnect", kind);
            return Err(WalletError::NotConnected);
        }

        match result {
            Ok(session) => {
                if let Err(e) = self.store.save(&session.persisted()) {
                    warn!("Failed to persist wallet session: {}", e);
                }
                *state = SessionState::Authenticated(session.clone());
                info!("Wallet connected: {} ({})", session.address, kind);
                Ok(session)
            }
            Err(e) => {
                *state = match previous {
                    Some(session) => {
                        info!("Keeping {} session after failed switch", session.wallet_type);
                        SessionState::Authenticated(session)
                    }
                    None => SessionState::Disconnected,
                };
                warn!("Wallet connection failed: {}", e);
                Err(e)
            }
        }
    }

    /// Drop the session and its persisted record. Cancels any attempt in flight.
    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        self.next_epoch();
        *state = SessionState::Disconnected;

        if let Err(e) = self.store.clear() {
            warn!("Failed to clear persisted wallet session: {}", e);
        }
        drop(state);
        info!("Wallet disconnected");
    }

    /// Re-validate the session, restoring a persisted one if needed.
    /// Returns whether the session is authenticated afterwards.
    pub async fn check_connection(&self) -> bool {
        let pending = {
            let mut state = self.state.write().await;
            match &*state {
                SessionState::Connecting { .. } | SessionState::Restoring { .. } => {
                    debug!("Connection attempt already in flight");
                    return false;
                }
                SessionState::Authenticated(session) => {
                    Pending::Probe(session.address.clone(), session.signer.clone())
                }
                SessionState::Disconnected => match self.store.load() {
                    Ok(Some(persisted)) => {
                        *state = SessionState::Restoring {
                            address: persisted.address.clone(),
                            wallet_type: persisted.wallet_type,
                        };
                        Pending::Restore(persisted, self.next_epoch())
                    }
                    Ok(None) => return false,
                    Err(e) => {
                        warn!("Failed to read persisted wallet session: {}", e);
                        return false;
                    }
                },
            }
        };

        match pending {
            Pending::Probe(address, signer) => self.probe(address, signer).await,
            Pending::Restore(persisted, epoch) => self.restore(persisted, epoch).await,
        }
    }

    /// Refresh the balance of the session address in the staking denom
    pub async fn update_balance(&self) -> WalletResult<Coin> {
        let (address, client) = match &*self.state.read().await {
            SessionState::Authenticated(session) => {
                (session.address.clone(), session.client.clone())
            }
            _ => return Err(WalletError::NotConnected),
        };

        let client = client.ok_or_else(|| {
            WalletError::NetworkUnavailable("no chain client for this session".to_string())
        })?;

        let denom = self.chain.staking_denom().to_string();
        let amount = client
            .balance(&address, &denom)
            .await
            .map_err(|e| WalletError::NetworkUnavailable(e.to_string()))?;
        let coin = Coin::new(amount, denom);

        let mut state = self.state.write().await;
        if let SessionState::Authenticated(session) = &mut *state {
            if session.address == address {
                session.balance = Some(coin.clone());
            }
        }
        Ok(coin)
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// True once an address is known, including while it is being restored
    pub async fn is_connected(&self) -> bool {
        matches!(
            &*self.state.read().await,
            SessionState::Restoring { .. } | SessionState::Authenticated(_)
        )
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(&*self.state.read().await, SessionState::Authenticated(s) if !s.address.is_empty())
    }

    pub async fn address(&self) -> Option<String> {
        match &*self.state.read().await {
            SessionState::Restoring { address, .. } => Some(address.clone()),
            SessionState::Authenticated(session) => Some(session.address.clone()),
            _ => None,
        }
    }

    pub async fn wallet_type(&self) -> Option<WalletKind> {
        match &*self.state.read().await {
            SessionState::Disconnected => None,
            SessionState::Connecting { wallet_type } => Some(*wallet_type),
            SessionState::Restoring { wallet_type, .. } => Some(*wallet_type),
            SessionState::Authenticated(session) => Some(session.wallet_type),
        }
    }

    pub async fn balance(&self) -> Option<Coin> {
        match &*self.state.read().await {
            SessionState::Authenticated(session) => session.balance.clone(),
            _ => None,
        }
    }

    pub async fn signer(&self) -> Option<Arc<dyn OfflineSigner>> {
        match &*self.state.read().await {
            SessionState::Authenticated(session) => Some(session.signer.clone()),
            _ => None,
        }
    }

    /// Steps shared by connect and restore; touches no session state
    async fn establish(&self, kind: WalletKind) -> WalletResult<Session> {
        let provider = provider_for(kind, self.host.clone());
        let signer = provider.connect(&self.chain).await?;

        let accounts = signer
            .get_accounts()
            .await
            .map_err(|e| WalletError::Unknown(e.to_string()))?;
        let account = accounts.into_iter().next().ok_or(WalletError::NoAccountFound)?;

        let client = match self.connector.connect(&self.chain).await {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Chain client unavailable, continuing signer-only: {}", e);
                None
            }
        };

        Ok(Session {
            address: account.address,
            wallet_type: kind,
            signer,
            client,
            balance: None,
            last_connection_check: Utc::now(),
        })
    }

    async fn probe(&self, address: String, signer: Arc<dyn OfflineSigner>) -> bool {
        let live = match signer.get_accounts().await {
            Ok(accounts) => accounts.first().map(|a| a.address == address).unwrap_or(false),
            Err(e) => {
                debug!("Signer probe failed: {}", e);
                false
            }
        };

        let mut state = self.state.write().await;
        let still_current =
            matches!(&*state, SessionState::Authenticated(s) if s.address == address);
        if !still_current {
            // Replaced or dropped while probing
            return matches!(&*state, SessionState::Authenticated(_));
        }

        if live {
            if let SessionState::Authenticated(session) = &mut *state {
                session.last_connection_check = Utc::now();
            }
            return true;
        }

        *state = SessionState::Disconnected;
        drop(state);
        info!("Wallet account changed or signer lost, session dropped");
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear persisted wallet session: {}", e);
        }
        false
    }

    /// Start a new attempt; call with the state write lock held
    fn next_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    async fn restore(&self, persisted: PersistedSession, epoch: u64) -> bool {
        debug!(
            "Restoring {} session for {}",
            persisted.wallet_type, persisted.address
        );

        let result = self.establish(persisted.wallet_type).await;
        let mut state = self.state.write().await;
        if !self.is_current(epoch) {
            debug!("Restore superseded by disconnect");
            return false;
        }

        match result {
            Ok(session) => {
                if session.address != persisted.address {
                    info!(
                        "Wallet account changed from {} to {}",
                        persisted.address, session.address
                    );
                    if let Err(e) = self.store.save(&session.persisted()) {
                        warn!("Failed to persist wallet session: {}", e);
                    }
                }
                *state = SessionState::Authenticated(session);
                info!("Wallet session restored");
                true
            }
            Err(e) => {
                debug!("Silent reconnect failed: {}", e);
                *state = SessionState::Disconnected;
                if let Err(e) = self.store.clear() {
                    warn!("Failed to clear persisted wallet session: {}", e);
                }
                false
            }
        }
    }
}

enum Pending {
    Probe(String, Arc<dyn OfflineSigner>),
    Restore(PersistedSession, u64),
}
