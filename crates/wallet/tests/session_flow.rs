mod common;

use capsule_common::tx::SignDoc;
use capsule_common::utils::logging::init_test_logging;
use capsule_wallet::{
    MemorySessionStore, PersistedSession, SessionState, SessionStore, SledSessionStore,
    WalletError, WalletKind, WalletResult, WalletSessionManager,
};
use common::{test_chain, MockConnector, MockExtension, MockHost, MockSigner};
use k256::ecdsa::signature::Verifier;
use k256::ecdsa::{Signature, VerifyingKey};
use prost::Message;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Harness {
    manager: WalletSessionManager,
    host: Arc<MockHost>,
    extension: Arc<MockExtension>,
    signer: Arc<MockSigner>,
    connector: Arc<MockConnector>,
    store: Arc<MemorySessionStore>,
}

fn harness_with(kind: WalletKind, signer: MockSigner, connector: MockConnector) -> Harness {
    init_test_logging();
    let signer = Arc::new(signer);
    let extension = Arc::new(MockExtension::new(signer.clone()));
    let host = Arc::new(MockHost::new());
    host.install(kind, extension.clone());
    let connector = Arc::new(connector);
    let store = Arc::new(MemorySessionStore::new());

    let manager = WalletSessionManager::new(
        test_chain(),
        host.clone(),
        connector.clone(),
        store.clone(),
    );

    Harness {
        manager,
        host,
        extension,
        signer,
        connector,
        store,
    }
}

fn harness(kind: WalletKind) -> Harness {
    harness_with(kind, MockSigner::new(1), MockConnector::new(7_500_000))
}

/// Store whose every operation fails
struct BrokenStore;

impl SessionStore for BrokenStore {
    fn load(&self) -> WalletResult<Option<PersistedSession>> {
        Err(WalletError::Storage("quota exceeded".to_string()))
    }

    fn save(&self, _session: &PersistedSession) -> WalletResult<()> {
        Err(WalletError::Storage("quota exceeded".to_string()))
    }

    fn clear(&self) -> WalletResult<()> {
        Err(WalletError::Storage("quota exceeded".to_string()))
    }
}

#[tokio::test]
async fn test_unsupported_wallet_type_fails_before_any_call() {
    let h = harness(WalletKind::Keplr);

    let err = h.manager.connect("metamask").await.unwrap_err();
    assert!(matches!(err, WalletError::WalletNotInstalled(_)));
    assert_eq!(h.host.lookups(), 0);
    assert_eq!(h.extension.suggest_calls(), 0);
    assert_eq!(h.connector.connects.load(Ordering::SeqCst), 0);
    assert!(matches!(h.manager.state().await, SessionState::Disconnected));
}

#[tokio::test]
async fn test_missing_extension_is_not_installed() {
    let h = harness(WalletKind::Keplr);

    let err = h.manager.connect("leap").await.unwrap_err();
    assert_eq!(err, WalletError::WalletNotInstalled("Leap".to_string()));
    assert_eq!(h.extension.suggest_calls(), 0);
    assert!(!h.manager.is_connected().await);
}

#[tokio::test]
async fn test_connect_authenticates_and_persists() {
    let h = harness(WalletKind::Keplr);

    let session = h.manager.connect("keplr").await.unwrap();
    assert_eq!(session.address, h.signer.address());
    assert_eq!(session.wallet_type, WalletKind::Keplr);
    assert!(session.has_client());

    assert!(h.manager.is_authenticated().await);
    assert!(h.manager.is_connected().await);
    assert_eq!(h.manager.address().await, Some(h.signer.address()));
    assert_eq!(h.manager.wallet_type().await, Some(WalletKind::Keplr));
    assert!(h.manager.signer().await.is_some());

    assert_eq!(h.extension.suggest_calls(), 1);
    assert_eq!(h.extension.enable_calls(), 1);
    assert_eq!(
        h.extension.suggested_chain.lock().unwrap().as_deref(),
        Some("capsule-testnet-1")
    );

    assert_eq!(
        h.store.load().unwrap(),
        Some(PersistedSession {
            address: h.signer.address(),
            wallet_type: WalletKind::Keplr,
        })
    );
}

#[tokio::test]
async fn test_cosmostation_uses_nested_provider() {
    let h = harness(WalletKind::Cosmostation);

    let session = h.manager.connect("cosmostation").await.unwrap();
    assert_eq!(session.wallet_type, WalletKind::Cosmostation);
    assert_eq!(h.extension.enable_calls(), 1);
}

#[tokio::test]
async fn test_rejected_chain_suggestion() {
    let h = harness(WalletKind::Keplr);
    h.extension.reject_suggest.store(true, Ordering::SeqCst);

    let err = h.manager.connect("keplr").await.unwrap_err();
    assert!(matches!(err, WalletError::ChainSuggestionRejected(_)));
    assert_eq!(h.extension.enable_calls(), 0);
    assert!(matches!(h.manager.state().await, SessionState::Disconnected));
    assert_eq!(h.store.load().unwrap(), None);
}

#[tokio::test]
async fn test_rejected_enable() {
    let h = harness(WalletKind::Leap);
    h.extension.reject_enable.store(true, Ordering::SeqCst);

    let err = h.manager.connect("leap").await.unwrap_err();
    assert!(matches!(err, WalletError::EnableRejected(_)));
    assert!(matches!(h.manager.state().await, SessionState::Disconnected));
}

#[tokio::test]
async fn test_empty_wallet_has_no_account() {
    let h = harness_with(WalletKind::Keplr, MockSigner::empty(), MockConnector::new(0));

    let err = h.manager.connect("keplr").await.unwrap_err();
    assert_eq!(err, WalletError::NoAccountFound);
    assert!(!h.manager.is_authenticated().await);
}

#[tokio::test]
async fn test_unreachable_node_degrades_to_signer_only() {
    let h = harness_with(
        WalletKind::Keplr,
        MockSigner::new(2),
        MockConnector::unreachable(),
    );

    let session = h.manager.connect("keplr").await.unwrap();
    assert!(!session.has_client());
    assert!(h.manager.is_authenticated().await);

    let err = h.manager.update_balance().await.unwrap_err();
    assert!(err.is_soft());
    assert!(h.manager.balance().await.is_none());
}

#[tokio::test]
async fn test_update_balance_keeps_last_known_on_failure() {
    let h = harness(WalletKind::Keplr);
    h.manager.connect("keplr").await.unwrap();

    let coin = h.manager.update_balance().await.unwrap();
    assert_eq!(coin.amount, "7500000");
    assert_eq!(coin.denom, "ucaps");
    assert_eq!(h.manager.balance().await, Some(coin.clone()));

    h.connector.client.offline.store(true, Ordering::SeqCst);
    let err = h.manager.update_balance().await.unwrap_err();
    assert!(matches!(err, WalletError::NetworkUnavailable(_)));
    assert_eq!(h.manager.balance().await, Some(coin));
}

#[tokio::test]
async fn test_update_balance_requires_session() {
    let h = harness(WalletKind::Keplr);
    let err = h.manager.update_balance().await.unwrap_err();
    assert_eq!(err, WalletError::NotConnected);
}

#[tokio::test]
async fn test_disconnect_clears_session_and_storage() {
    let h = harness(WalletKind::Keplr);
    h.manager.connect("keplr").await.unwrap();

    h.manager.disconnect().await;
    assert!(matches!(h.manager.state().await, SessionState::Disconnected));
    assert_eq!(h.manager.address().await, None);
    assert_eq!(h.manager.wallet_type().await, None);
    assert!(h.manager.signer().await.is_none());
    assert_eq!(h.store.load().unwrap(), None);

    // Nothing persisted, nothing to restore
    assert!(!h.manager.check_connection().await);
}

#[tokio::test]
async fn test_storage_failures_are_swallowed() {
    let signer = Arc::new(MockSigner::new(3));
    let host = Arc::new(MockHost::new());
    host.install(WalletKind::Keplr, Arc::new(MockExtension::new(signer.clone())));
    let manager = WalletSessionManager::new(
        test_chain(),
        host,
        Arc::new(MockConnector::new(0)),
        Arc::new(BrokenStore),
    );

    let session = manager.connect("keplr").await.unwrap();
    assert_eq!(session.address, signer.address());

    manager.disconnect().await;
    assert!(!manager.is_connected().await);
    assert!(!manager.check_connection().await);
}

#[tokio::test]
async fn test_persisted_session_is_restored() {
    let h = harness(WalletKind::Keplr);
    h.store
        .save(&PersistedSession {
            address: h.signer.address(),
            wallet_type: WalletKind::Keplr,
        })
        .unwrap();

    assert!(h.manager.check_connection().await);
    assert!(h.manager.is_authenticated().await);
    assert_eq!(h.manager.address().await, Some(h.signer.address()));
    assert_eq!(h.extension.enable_calls(), 1);
}

#[tokio::test]
async fn test_rapid_checks_prompt_once() {
    let h = harness(WalletKind::Keplr);
    h.store
        .save(&PersistedSession {
            address: h.signer.address(),
            wallet_type: WalletKind::Keplr,
        })
        .unwrap();
    *h.extension.enable_delay.lock().unwrap() = Duration::from_millis(50);

    let (first, second) = tokio::join!(h.manager.check_connection(), h.manager.check_connection());
    assert!(first);
    assert!(!second);
    assert_eq!(h.extension.enable_calls(), 1);
    assert!(h.manager.is_authenticated().await);
}

#[tokio::test]
async fn test_connect_while_connecting_is_refused() {
    let h = harness(WalletKind::Keplr);
    *h.extension.enable_delay.lock().unwrap() = Duration::from_millis(50);

    let (first, second) = tokio::join!(h.manager.connect("keplr"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.manager.connect("keplr").await
    });
    assert!(first.is_ok());
    assert_eq!(second.unwrap_err(), WalletError::ConnectionInProgress);
    assert_eq!(h.extension.enable_calls(), 1);
}

#[tokio::test]
async fn test_failed_restore_is_silent() {
    let h = harness(WalletKind::Keplr);
    h.store
        .save(&PersistedSession {
            address: h.signer.address(),
            wallet_type: WalletKind::Keplr,
        })
        .unwrap();
    h.host.uninstall(WalletKind::Keplr);

    assert!(!h.manager.check_connection().await);
    assert!(matches!(h.manager.state().await, SessionState::Disconnected));
    assert_eq!(h.store.load().unwrap(), None);
}

#[tokio::test]
async fn test_restore_adopts_switched_account() {
    let h = harness(WalletKind::Leap);
    let stale = format!("cosmos1{}", "q".repeat(38));
    h.store
        .save(&PersistedSession {
            address: stale,
            wallet_type: WalletKind::Leap,
        })
        .unwrap();

    assert!(h.manager.check_connection().await);
    assert_eq!(h.manager.address().await, Some(h.signer.address()));
    assert_eq!(h.store.load().unwrap().unwrap().address, h.signer.address());
}

#[tokio::test]
async fn test_liveness_probe() {
    let h = harness(WalletKind::Keplr);
    let session = h.manager.connect("keplr").await.unwrap();

    assert!(h.manager.check_connection().await);
    match h.manager.state().await {
        SessionState::Authenticated(current) => {
            assert!(current.last_connection_check >= session.last_connection_check)
        }
        other => panic!("unexpected state: {other:?}"),
    }
    // Probing never prompts again
    assert_eq!(h.extension.enable_calls(), 1);

    // Account switched in the extension
    let other = MockSigner::new(9);
    *h.signer.accounts.lock().unwrap() = other.accounts.lock().unwrap().clone();

    assert!(!h.manager.check_connection().await);
    assert!(matches!(h.manager.state().await, SessionState::Disconnected));
    assert_eq!(h.store.load().unwrap(), None);
}

#[tokio::test]
async fn test_locked_signer_drops_session() {
    let h = harness(WalletKind::Keplr);
    h.manager.connect("keplr").await.unwrap();

    h.signer.fail.store(true, Ordering::SeqCst);
    assert!(!h.manager.check_connection().await);
    assert!(!h.manager.is_authenticated().await);
}

#[tokio::test]
async fn test_session_signer_signs_direct() {
    let h = harness(WalletKind::Keplr);
    let session = h.manager.connect("keplr").await.unwrap();
    let signer = h.manager.signer().await.unwrap();

    let sign_doc = SignDoc {
        body_bytes: vec![1, 2, 3],
        auth_info_bytes: vec![4, 5, 6],
        chain_id: "capsule-testnet-1".to_string(),
        account_number: 3,
    };
    let raw = signer.sign_direct(&session.address, &sign_doc).await.unwrap();
    assert_eq!(raw.len(), 64);

    let verifying = VerifyingKey::from_sec1_bytes(&h.signer.public_key()).unwrap();
    let signature = Signature::from_slice(&raw).unwrap();
    assert!(verifying
        .verify(&sign_doc.encode_to_vec(), &signature)
        .is_ok());
}

#[tokio::test]
async fn test_list_available_wallets() {
    let h = harness(WalletKind::Keplr);

    let wallets = h.manager.list_available_wallets();
    assert_eq!(wallets.len(), 3);
    assert_eq!(wallets[0].wallet_type, WalletKind::Keplr);
    assert_eq!(wallets[0].name, "Keplr");
    assert!(wallets[0].installed);
    assert!(!wallets[1].installed);
    assert!(!wallets[2].installed);
    assert!(wallets.iter().all(|w| !w.description.is_empty()));
}

#[tokio::test]
async fn test_sled_session_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("wallet");
    let signer = Arc::new(MockSigner::new(4));
    let host = Arc::new(MockHost::new());
    host.install(WalletKind::Keplr, Arc::new(MockExtension::new(signer.clone())));

    {
        let manager = WalletSessionManager::new(
            test_chain(),
            host.clone(),
            Arc::new(MockConnector::new(0)),
            Arc::new(SledSessionStore::open(&path).unwrap()),
        );
        manager.connect("keplr").await.unwrap();
    }

    let manager = WalletSessionManager::new(
        test_chain(),
        host,
        Arc::new(MockConnector::new(0)),
        Arc::new(SledSessionStore::open(&path).unwrap()),
    );
    assert!(!manager.is_authenticated().await);
    assert!(manager.check_connection().await);
    assert_eq!(manager.address().await, Some(signer.address()));
}

#[tokio::test]
async fn test_disconnect_cancels_pending_connect() {
    let h = harness(WalletKind::Keplr);
    *h.extension.enable_delay.lock().unwrap() = Duration::from_millis(50);

    let (connected, _) = tokio::join!(h.manager.connect("keplr"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.manager.disconnect().await
    });
    assert_eq!(connected.unwrap_err(), WalletError::NotConnected);
    assert!(matches!(h.manager.state().await, SessionState::Disconnected));
    assert_eq!(h.store.load().unwrap(), None);

    // Nothing left behind for a later check to resurrect
    assert!(!h.manager.check_connection().await);
    assert_eq!(h.extension.enable_calls(), 1);
}

#[tokio::test]
async fn test_disconnect_cancels_pending_restore() {
    let h = harness(WalletKind::Keplr);
    h.store
        .save(&PersistedSession {
            address: h.signer.address(),
            wallet_type: WalletKind::Keplr,
        })
        .unwrap();
    *h.extension.enable_delay.lock().unwrap() = Duration::from_millis(50);

    let (restored, _) = tokio::join!(h.manager.check_connection(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.manager.disconnect().await
    });
    assert!(!restored);
    assert!(!h.manager.is_authenticated().await);
    assert_eq!(h.store.load().unwrap(), None);
    assert!(!h.manager.check_connection().await);
}

#[tokio::test]
async fn test_failed_switch_keeps_previous_session() {
    let h = harness(WalletKind::Keplr);
    h.manager.connect("keplr").await.unwrap();

    let leap = Arc::new(MockExtension::new(Arc::new(MockSigner::new(5))));
    leap.reject_enable.store(true, Ordering::SeqCst);
    h.host.install(WalletKind::Leap, leap.clone());

    let err = h.manager.connect("leap").await.unwrap_err();
    assert!(matches!(err, WalletError::EnableRejected(_)));
    assert_eq!(leap.enable_calls(), 1);

    assert!(h.manager.is_authenticated().await);
    assert_eq!(h.manager.wallet_type().await, Some(WalletKind::Keplr));
    assert_eq!(h.manager.address().await, Some(h.signer.address()));
    assert_eq!(
        h.store.load().unwrap(),
        Some(PersistedSession {
            address: h.signer.address(),
            wallet_type: WalletKind::Keplr,
        })
    );
    assert!(h.manager.check_connection().await);
}

#[tokio::test]
async fn test_successful_switch_replaces_session() {
    let h = harness(WalletKind::Keplr);
    h.manager.connect("keplr").await.unwrap();

    let leap_signer = Arc::new(MockSigner::new(6));
    h.host
        .install(WalletKind::Leap, Arc::new(MockExtension::new(leap_signer.clone())));

    let session = h.manager.connect("leap").await.unwrap();
    assert_eq!(session.address, leap_signer.address());
    assert_eq!(h.manager.wallet_type().await, Some(WalletKind::Leap));
    assert_eq!(h.store.load().unwrap().unwrap().wallet_type, WalletKind::Leap);
}
