// SPDX-FileCopyrightText: © 2026 Lucky Kat Studios
// SPDX-License-Identifier: AGPL-3.0-or-later

#![forbid(unsafe_code)]

use thiserror::Error;

/// Failure classes surfaced by the adapter.
///
/// Every public operation both returns its error and emits it on the event
/// stream, so the type is `Clone`. Typed variants pass through the connect
/// race unwrapped; only foreign wallet rejections get wrapped as
/// [`AdapterError::Connection`].
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum AdapterError {
    /// The host environment cannot reach a wallet at all.
    #[error("Wallet not ready")]
    NotReady,

    /// The wallet implementation could not be acquired.
    #[error("Failed to load wallet module: {0}")]
    Load(String),

    /// The wallet rejected its construction arguments.
    #[error("Wallet configuration rejected: {0}")]
    Config(String),

    /// The popup or extension window was closed before the wallet connected.
    #[error("Wallet window closed")]
    WindowClosed,

    /// No popup window appeared within the poll threshold.
    #[error("Wallet window blocked")]
    WindowBlocked,

    /// No signal from the extension within the configured ceiling.
    #[error("Timed out waiting for wallet")]
    Timeout,

    /// Catch-all for foreign rejections during the connect race.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The wallet connected but reported no account key.
    #[error("Wallet reported no account")]
    Account,

    /// The wallet's key bytes did not form a valid public key.
    #[error("Invalid public key: {0}")]
    PublicKey(String),

    /// The wallet's disconnect call failed. Non-fatal: the session is torn
    /// down regardless, so this only ever travels the event stream.
    #[error("Disconnect failed: {0}")]
    Disconnection(String),

    /// The wallet ended the session without being asked to.
    #[error("Wallet disconnected")]
    Disconnected,

    /// The operation requires an active session.
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Failed to sign transaction: {0}")]
    SignTransaction(String),

    #[error("Failed to sign message: {0}")]
    SignMessage(String),
}

pub type Result<T> = std::result::Result<T, AdapterError>;
