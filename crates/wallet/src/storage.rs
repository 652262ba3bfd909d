//! Persisted session record

use crate::error::{WalletError, WalletResult};
use crate::kind::WalletKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

/// Key under which the session record is kept
pub const SESSION_STORAGE_KEY: &str = "capsule-auth-storage";

/// The subset of a session that survives a restart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub address: String,
    pub wallet_type: WalletKind,
}

/// Durable slot for at most one session
pub trait SessionStore: Send + Sync {
    fn load(&self) -> WalletResult<Option<PersistedSession>>;

    fn save(&self, session: &PersistedSession) -> WalletResult<()>;

    fn clear(&self) -> WalletResult<()>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> WalletResult<std::sync::MutexGuard<'_, Option<PersistedSession>>> {
        self.slot
            .lock()
            .map_err(|_| WalletError::Storage("session slot lock poisoned".to_string()))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> WalletResult<Option<PersistedSession>> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, session: &PersistedSession) -> WalletResult<()> {
        *self.slot()? = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> WalletResult<()> {
        *self.slot()? = None;
        Ok(())
    }
}

/// Sled-backed store; the record is stored as JSON
pub struct SledSessionStore {
    db: sled::Db,
}

impl SledSessionStore {
    pub fn open<P: AsRef<Path>>(path: P) -> WalletResult<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    pub fn temporary() -> WalletResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }
}

impl SessionStore for SledSessionStore {
    fn load(&self) -> WalletResult<Option<PersistedSession>> {
        match self.db.get(SESSION_STORAGE_KEY)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&self, session: &PersistedSession) -> WalletResult<()> {
        let bytes = serde_json::to_vec(session)?;
        self.db.insert(SESSION_STORAGE_KEY, bytes)?;
        self.db.flush()?;
        Ok(())
    }

    fn clear(&self) -> WalletResult<()> {
        self.db.remove(SESSION_STORAGE_KEY)?;
        self.db.flush()?;
        Ok(())
    }
}
