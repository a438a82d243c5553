// SPDX-FileCopyrightText: © 2026 Lucky Kat Studios
// SPDX-License-Identifier: AGPL-3.0-or-later

#![forbid(unsafe_code)]

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;
use zeroize::Zeroizing;

use crate::config::ProviderLocator;
use crate::keys::Transaction;

/// Message the wallet rejects its own disconnect call with when the session
/// is already gone. The disconnect handshake treats it as success.
pub const BENIGN_DISCONNECT_MESSAGE: &str = "Wallet disconnected";

/// Rejection reason from an external wallet call.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub struct WalletCallError {
    pub message: String,
}

impl WalletCallError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// True for the rejection the wallet raises when asked to disconnect a
    /// session that is already dead.
    pub fn is_benign_disconnect(&self) -> bool {
        self.message == BENIGN_DISCONNECT_MESSAGE
    }
}

/// Events emitted by the external wallet object itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    Connected,
    Disconnected,
}

/// Handler slot the wallet invokes when its session ends unexpectedly.
///
/// The adapter temporarily decorates this slot during the connect race and
/// the disconnect handshake. Decorations must forward to the handler they
/// replaced, and the adapter restores the original before either operation
/// returns.
pub type SessionEndedHook = Arc<dyn Fn() + Send + Sync>;

/// Arguments handed to [`WalletFactory::create`].
#[derive(Clone)]
pub struct SessionArgs {
    pub provider: ProviderLocator,
    pub server_url: String,
    pub id_token: Option<Zeroizing<String>>,
    pub override_wallet_url: Option<String>,
}

/// The external wallet collaborator.
///
/// Implementations own the popup/extension bridge and the key material; the
/// adapter only drives their lifecycle. Success of `connect` is signaled by
/// the [`WalletEvent::Connected`] event, not by the call resolving.
///
/// `window_opened` is an explicit capability: URL-based wallets must report
/// whether their popup frame exists so a blocked window can be detected
/// without reaching into implementation internals.
#[async_trait]
pub trait WalletSession: Send + Sync {
    async fn connect(&self) -> Result<(), WalletCallError>;

    async fn disconnect(&self) -> Result<(), WalletCallError>;

    /// `None` means the wallet produced no result; the adapter echoes the
    /// input back in that case.
    async fn sign_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Option<Transaction>, WalletCallError>;

    async fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Option<Vec<Transaction>>, WalletCallError>;

    /// Takes and returns base58 text; the adapter owns the byte translation
    /// on both sides.
    async fn sign_message(&self, encoded_message: &str) -> Result<String, WalletCallError>;

    fn public_key(&self) -> Option<Vec<u8>>;

    fn connected(&self) -> bool;

    fn window_opened(&self) -> bool;

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;

    fn session_ended_hook(&self) -> SessionEndedHook;

    fn set_session_ended_hook(&self, hook: SessionEndedHook);
}

/// Builds a wallet session from adapter configuration.
///
/// Construction failures are configuration errors, distinct from anything
/// that can go wrong once the session exists.
pub trait WalletFactory: Send + Sync {
    fn create(&self, args: SessionArgs) -> Result<Arc<dyn WalletSession>, WalletCallError>;
}

/// Acquires the wallet implementation, e.g. by loading a dynamic module.
/// Failure here is a load error, distinct from every later failure class.
#[async_trait]
pub trait WalletLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn WalletFactory>, WalletCallError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benign_disconnect_is_exact_match() {
        assert!(WalletCallError::new("Wallet disconnected").is_benign_disconnect());
        assert!(!WalletCallError::new("wallet disconnected").is_benign_disconnect());
        assert!(!WalletCallError::new("Relay unreachable").is_benign_disconnect());
    }
}
