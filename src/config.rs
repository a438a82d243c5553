// SPDX-FileCopyrightText: © 2026 Lucky Kat Studios
// SPDX-License-Identifier: AGPL-3.0-or-later

#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::error::Result;

/// Where the external wallet UI lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderLocator {
    /// A web page the wallet opens in a popup frame.
    Url(String),
    /// A browser-extension handle.
    Extension(String),
}

impl ProviderLocator {
    pub fn is_url(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

/// Supplies an opaque identity token, fetched once per connect attempt.
///
/// Errors from the supplier reach the `connect` caller unwrapped; this is
/// caller-provided behavior, not part of the wallet.
#[async_trait]
pub trait IdTokenProvider: Send + Sync {
    async fn id_token(&self) -> Result<Zeroizing<String>>;
}

/// Timing knobs for the connect race and the disconnect handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timing {
    /// How often to check for popup-window evidence (URL providers).
    pub popup_poll_interval: Duration,
    /// How many polls without a window before the popup counts as blocked.
    pub popup_poll_attempts: u32,
    /// Ceiling for extension providers. Registration can legitimately take
    /// minutes, so the default is a long ceiling rather than a real-time
    /// bound.
    pub extension_ceiling: Duration,
    /// How long to wait on the wallet's own disconnect call before
    /// proceeding anyway.
    pub disconnect_grace: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            popup_poll_interval: Duration::from_millis(100),
            popup_poll_attempts: 50,
            extension_ceiling: Duration::from_millis(11_500_000),
            disconnect_grace: Duration::from_millis(250),
        }
    }
}

/// Whether the host can open a wallet window at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostWindowing {
    Available,
    Unavailable,
}

impl HostWindowing {
    /// Probe the host once. macOS and Windows always have a windowing
    /// environment; elsewhere a display server must be reachable.
    pub fn detect() -> Self {
        if cfg!(any(target_os = "macos", target_os = "windows")) {
            return Self::Available;
        }
        if std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Self::Available
        } else {
            Self::Unavailable
        }
    }
}

/// Immutable adapter configuration, supplied once at construction.
#[derive(Clone)]
pub struct AdapterConfig {
    pub provider: ProviderLocator,
    pub server_url: String,
    pub id_token_provider: Option<Arc<dyn IdTokenProvider>>,
    pub override_wallet_url: Option<String>,
    pub timing: Timing,
}

impl AdapterConfig {
    pub fn new(provider: ProviderLocator, server_url: impl Into<String>) -> Self {
        Self {
            provider,
            server_url: server_url.into(),
            id_token_provider: None,
            override_wallet_url: None,
            timing: Timing::default(),
        }
    }

    pub fn with_id_token_provider(mut self, provider: Arc<dyn IdTokenProvider>) -> Self {
        self.id_token_provider = Some(provider);
        self
    }

    pub fn with_override_wallet_url(mut self, url: impl Into<String>) -> Self {
        self.override_wallet_url = Some(url.into());
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("provider", &self.provider)
            .field("server_url", &self.server_url)
            .field("id_token_provider", &self.id_token_provider.is_some())
            .field("override_wallet_url", &self.override_wallet_url)
            .field("timing", &self.timing)
            .finish()
    }
}

/// Check that a URL provider locator is something a popup can navigate to.
pub(crate) fn validate_provider_url(raw: &str) -> std::result::Result<(), String> {
    let url = url::Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("Unsupported scheme: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_defaults_match_wallet_behavior() {
        let timing = Timing::default();
        assert_eq!(timing.popup_poll_interval, Duration::from_millis(100));
        assert_eq!(timing.popup_poll_attempts, 50);
        assert_eq!(timing.extension_ceiling, Duration::from_millis(11_500_000));
        assert_eq!(timing.disconnect_grace, Duration::from_millis(250));
    }

    #[test]
    fn locator_kind() {
        assert!(ProviderLocator::Url("https://wallet.lucky-kat.com".into()).is_url());
        assert!(!ProviderLocator::Extension("lucky-wallet".into()).is_url());
    }

    #[test]
    fn accepts_http_and_https_providers() {
        assert!(validate_provider_url("https://wallet.lucky-kat.com/app").is_ok());
        assert!(validate_provider_url("http://localhost:3000").is_ok());
    }

    #[test]
    fn rejects_non_web_providers() {
        assert!(validate_provider_url("file:///etc/passwd").is_err());
        assert!(validate_provider_url("not a url").is_err());
    }
}
