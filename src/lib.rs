// SPDX-FileCopyrightText: © 2026 Lucky Kat Studios
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Connection-lifecycle adapter for the Lucky Wallet popup/extension signer.
//!
//! The external wallet owns the UI and the key material. This crate owns the
//! state machine that reconciles three unreliable signal sources (the
//! wallet's own event callbacks, a popup window that can close or be blocked
//! without notice, and a registration flow that can legitimately take
//! minutes) into one deterministic connect/disconnect lifecycle with
//! forwarded signing operations.

#![forbid(unsafe_code)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod events;
pub mod keys;
pub mod wallet;

pub use adapter::{LuckyWalletAdapter, ReadyState};
pub use config::{AdapterConfig, HostWindowing, IdTokenProvider, ProviderLocator, Timing};
pub use error::{AdapterError, Result};
pub use events::AdapterEvent;
pub use keys::{PublicKey, Transaction, PUBLIC_KEY_LENGTH};
pub use wallet::{
    SessionArgs, SessionEndedHook, WalletCallError, WalletEvent, WalletFactory, WalletLoader,
    WalletSession,
};
