// SPDX-FileCopyrightText: © 2026 Lucky Kat Studios
// SPDX-License-Identifier: AGPL-3.0-or-later

#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};
use tracing::{debug, info, warn};

use crate::config::{validate_provider_url, AdapterConfig, HostWindowing, ProviderLocator};
use crate::error::{AdapterError, Result};
use crate::events::{AdapterEvent, EventBus};
use crate::keys::{PublicKey, Transaction};
use crate::wallet::{
    SessionArgs, SessionEndedHook, WalletCallError, WalletEvent, WalletLoader, WalletSession,
};

/// Whether a wallet is reachable at all. Computed once when the adapter is
/// built and never re-evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadyState {
    Unsupported,
    NotDetected,
    Loadable,
    Installed,
}

impl ReadyState {
    fn usable(self) -> bool {
        matches!(self, Self::Loadable | Self::Installed)
    }
}

/// The live state for one connected wallet. At most one exists at a time.
struct Session {
    wallet: Arc<dyn WalletSession>,
    public_key: PublicKey,
    watcher: JoinHandle<()>,
}

struct Shared {
    session: Mutex<Option<Session>>,
    connecting: AtomicBool,
    events: EventBus,
}

impl Shared {
    /// Wallet-initiated disconnect: the user revoked access on the provider
    /// side. Converges on the same terminal state as `disconnect()`, and is
    /// idempotent against a session that was already torn down.
    fn wallet_disconnected(&self) {
        if self.session.lock().take().is_some() {
            warn!("wallet ended the session unsolicited");
            self.events
                .emit(AdapterEvent::Error(AdapterError::Disconnected));
            self.events.emit(AdapterEvent::Disconnect);
        }
    }
}

/// Clears the connecting flag on every exit path of a connect attempt.
struct ConnectingGuard<'a>(&'a AtomicBool);

impl<'a> ConnectingGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Temporarily decorates the wallet's session-ended hook.
///
/// The decoration signals the raced channel and then forwards to the
/// original handler, so the underlying side effects still run exactly once.
/// Dropping the guard restores the original handler, whichever way the race
/// ended.
struct HookGuard {
    wallet: Arc<dyn WalletSession>,
    original: SessionEndedHook,
}

impl HookGuard {
    fn decorate(wallet: &Arc<dyn WalletSession>, ended_tx: mpsc::Sender<()>) -> Self {
        let original = wallet.session_ended_hook();
        let forward = original.clone();
        wallet.set_session_ended_hook(Arc::new(move || {
            let _ = ended_tx.try_send(());
            (*forward)();
        }));
        Self {
            wallet: wallet.clone(),
            original,
        }
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        self.wallet.set_session_ended_hook(self.original.clone());
    }
}

/// The connection lifecycle controller for a Lucky Wallet popup or
/// extension.
///
/// Owns at most one live session. All state transitions happen inside
/// `connect`, `disconnect`, or the wallet-initiated disconnect watcher; the
/// adapter itself outlives any single session.
pub struct LuckyWalletAdapter {
    config: AdapterConfig,
    loader: Arc<dyn WalletLoader>,
    ready_state: ReadyState,
    shared: Arc<Shared>,
}

impl LuckyWalletAdapter {
    /// Build an adapter, probing the host environment for windowing support.
    pub fn new(config: AdapterConfig, loader: Arc<dyn WalletLoader>) -> Self {
        Self::with_host(config, loader, HostWindowing::detect())
    }

    /// Build an adapter with an explicit host probe result.
    pub fn with_host(
        config: AdapterConfig,
        loader: Arc<dyn WalletLoader>,
        host: HostWindowing,
    ) -> Self {
        let ready_state = match host {
            HostWindowing::Unavailable => ReadyState::Unsupported,
            HostWindowing::Available => ReadyState::Installed,
        };
        Self {
            config,
            loader,
            ready_state,
            shared: Arc::new(Shared {
                session: Mutex::new(None),
                connecting: AtomicBool::new(false),
                events: EventBus::new(),
            }),
        }
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn public_key(&self) -> Option<PublicKey> {
        self.shared.session.lock().as_ref().map(|s| s.public_key)
    }

    pub fn connecting(&self) -> bool {
        self.shared.connecting.load(Ordering::SeqCst)
    }

    pub fn connected(&self) -> bool {
        self.shared
            .session
            .lock()
            .as_ref()
            .is_some_and(|s| s.wallet.connected())
    }

    /// Subscribe to connect / disconnect / error events.
    pub fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.shared.events.subscribe()
    }

    /// Emit and return, so every failure reaches both the caller and the
    /// event stream.
    fn fail(&self, error: AdapterError) -> AdapterError {
        self.shared.events.emit(AdapterEvent::Error(error.clone()));
        error
    }

    /// Establish a session. A no-op while already connected or connecting.
    pub async fn connect(&self) -> Result<()> {
        if self.connected() || self.connecting() {
            return Ok(());
        }
        self.establish().await.map_err(|e| self.fail(e))
    }

    async fn establish(&self) -> Result<()> {
        if !self.ready_state.usable() {
            return Err(AdapterError::NotReady);
        }

        let _connecting = ConnectingGuard::engage(&self.shared.connecting);

        debug!(provider = ?self.config.provider, "connecting wallet");

        let factory = self
            .loader
            .load()
            .await
            .map_err(|e| AdapterError::Load(e.message))?;

        if let ProviderLocator::Url(raw) = &self.config.provider {
            validate_provider_url(raw).map_err(AdapterError::Config)?;
        }

        let id_token = match &self.config.id_token_provider {
            Some(provider) => Some(provider.id_token().await?),
            None => None,
        };

        let wallet = factory
            .create(SessionArgs {
                provider: self.config.provider.clone(),
                server_url: self.config.server_url.clone(),
                id_token,
                override_wallet_url: self.config.override_wallet_url.clone(),
            })
            .map_err(|e| AdapterError::Config(e.message))?;

        // The wallet does not reject or emit anything when its popup is
        // closed or blocked, so the session-ended slot is decorated for the
        // duration of the race.
        let (ended_tx, mut ended_rx) = mpsc::channel(1);
        let hook_guard = HookGuard::decorate(&wallet, ended_tx);
        let raced = self.drive_connect(&wallet, &mut ended_rx).await;
        drop(hook_guard);
        raced?;

        let raw_key = wallet.public_key().ok_or(AdapterError::Account)?;
        let public_key =
            PublicKey::from_bytes(&raw_key).map_err(|e| AdapterError::PublicKey(e.to_string()))?;

        let watcher = self.spawn_disconnect_watcher(wallet.clone());
        *self.shared.session.lock() = Some(Session {
            wallet,
            public_key,
            watcher,
        });

        info!(key = %public_key, "wallet connected");
        self.shared.events.emit(AdapterEvent::Connect(public_key));
        Ok(())
    }

    /// Arbitrate the competing connect outcomes into exactly one resolution.
    /// Dropping the unchosen branches tears their timers and subscriptions
    /// down with them.
    async fn drive_connect(
        &self,
        wallet: &Arc<dyn WalletSession>,
        ended_rx: &mut mpsc::Receiver<()>,
    ) -> Result<()> {
        let timing = &self.config.timing;
        let mut events = wallet.subscribe();

        let mut connect_call = wallet.connect();
        let mut call_pending = true;
        let mut ended_open = true;

        let is_popup = self.config.provider.is_url();
        let mut poll = interval(timing.popup_poll_interval);
        let mut polls_without_window = 0u32;
        let mut window_seen = false;

        let ceiling = sleep(timing.extension_ceiling);
        tokio::pin!(ceiling);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(WalletEvent::Connected) => return Ok(()),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(AdapterError::Connection("Wallet event stream closed".into()));
                    }
                },
                result = &mut connect_call, if call_pending => match result {
                    // Success is signaled by the Connected event, not by the
                    // call resolving; keep racing.
                    Ok(()) => call_pending = false,
                    Err(e) => return Err(AdapterError::Connection(e.message)),
                },
                fired = ended_rx.recv(), if ended_open => match fired {
                    Some(()) => return Err(AdapterError::WindowClosed),
                    None => ended_open = false,
                },
                _ = poll.tick(), if is_popup && !window_seen => {
                    if wallet.window_opened() {
                        window_seen = true;
                    } else {
                        polls_without_window += 1;
                        if polls_without_window > timing.popup_poll_attempts {
                            return Err(AdapterError::WindowBlocked);
                        }
                    }
                },
                _ = &mut ceiling, if !is_popup => return Err(AdapterError::Timeout),
            }
        }
    }

    /// Tear down the session. Always converges to the disconnected state and
    /// always ends with a `Disconnect` event; wallet failures are reported
    /// on the error channel, never returned.
    pub async fn disconnect(&self) {
        let taken = self.shared.session.lock().take();
        if let Some(session) = taken {
            session.watcher.abort();
            debug!("disconnecting wallet");

            let (ended_tx, mut ended_rx) = mpsc::channel(1);
            let hook_guard = HookGuard::decorate(&session.wallet, ended_tx);
            let outcome = self.drive_disconnect(&session.wallet, &mut ended_rx).await;
            drop(hook_guard);

            if let Err(e) = outcome {
                warn!(error = %e, "wallet disconnect failed");
                self.shared
                    .events
                    .emit(AdapterEvent::Error(AdapterError::Disconnection(e.message)));
            }
        }
        self.shared.events.emit(AdapterEvent::Disconnect);
    }

    /// Wait on the wallet's own disconnect call, which may hang forever or
    /// reject spuriously, for at most the grace period.
    async fn drive_disconnect(
        &self,
        wallet: &Arc<dyn WalletSession>,
        ended_rx: &mut mpsc::Receiver<()>,
    ) -> std::result::Result<(), WalletCallError> {
        let grace = sleep(self.config.timing.disconnect_grace);
        tokio::pin!(grace);

        let mut call = wallet.disconnect();

        tokio::select! {
            result = &mut call => match result {
                Ok(()) => Ok(()),
                Err(e) if e.is_benign_disconnect() => Ok(()),
                Err(e) => Err(e),
            },
            _ = ended_rx.recv() => Ok(()),
            _ = &mut grace => Ok(()),
        }
    }

    fn spawn_disconnect_watcher(&self, wallet: Arc<dyn WalletSession>) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        let mut events = wallet.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(WalletEvent::Disconnected) => {
                        shared.wallet_disconnected();
                        break;
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Sign a transaction with the connected wallet.
    pub async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        self.try_sign_transaction(transaction)
            .await
            .map_err(|e| self.fail(e))
    }

    async fn try_sign_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        let wallet = self.active_wallet()?;
        match wallet.sign_transaction(transaction.clone()).await {
            Ok(Some(signed)) => Ok(signed),
            Ok(None) => Ok(transaction),
            Err(e) => Err(AdapterError::SignTransaction(e.message)),
        }
    }

    /// Sign a batch of transactions with the connected wallet.
    pub async fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<Transaction>> {
        self.try_sign_all_transactions(transactions)
            .await
            .map_err(|e| self.fail(e))
    }

    async fn try_sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<Transaction>> {
        let wallet = self.active_wallet()?;
        match wallet.sign_all_transactions(transactions.clone()).await {
            Ok(Some(signed)) => Ok(signed),
            Ok(None) => Ok(transactions),
            Err(e) => Err(AdapterError::SignTransaction(e.message)),
        }
    }

    /// Sign raw message bytes. The wire format to the wallet is base58 text;
    /// the returned signature is decoded back to raw bytes.
    pub async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>> {
        self.try_sign_message(message).await.map_err(|e| self.fail(e))
    }

    async fn try_sign_message(&self, message: &[u8]) -> Result<Vec<u8>> {
        let wallet = self.active_wallet()?;
        let encoded = bs58::encode(message).into_string();
        let signature = wallet
            .sign_message(&encoded)
            .await
            .map_err(|e| AdapterError::SignMessage(e.message))?;
        bs58::decode(&signature)
            .into_vec()
            .map_err(|e| AdapterError::SignMessage(e.to_string()))
    }

    fn active_wallet(&self) -> Result<Arc<dyn WalletSession>> {
        self.shared
            .session
            .lock()
            .as_ref()
            .map(|s| Arc::clone(&s.wallet))
            .ok_or(AdapterError::NotConnected)
    }
}

impl Drop for LuckyWalletAdapter {
    fn drop(&mut self) {
        if let Some(session) = self.shared.session.lock().take() {
            session.watcher.abort();
        }
    }
}
