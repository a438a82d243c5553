// SPDX-FileCopyrightText: © 2026 Lucky Kat Studios
// SPDX-License-Identifier: AGPL-3.0-or-later

#![forbid(unsafe_code)]

use tokio::sync::broadcast;

use crate::error::AdapterError;
use crate::keys::PublicKey;

/// Events observable by the host application.
///
/// Errors travel both channels: the operation that failed returns the error,
/// and the same value is broadcast here for passive observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdapterEvent {
    /// A session was established with the given key.
    Connect(PublicKey),
    /// The session ended, by either side.
    Disconnect,
    /// An operation failed with this error.
    Error(AdapterError),
}

const EVENT_CAPACITY: usize = 64;

/// Broadcast fan-out for adapter events. Emission never blocks and events
/// are dropped when nobody listens.
pub(crate) struct EventBus {
    tx: broadcast::Sender<AdapterEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: AdapterEvent) {
        let _ = self.tx.send(event);
    }
}
