/*
[INPUT]:  Wallet base URL, app key prefix, timeout and channel settings
[OUTPUT]: Validated configuration and derived wallet endpoints
[POS]:    Configuration layer - shared by auth flow, channel and signer
[UPDATE]: When adding connection options or changing endpoint layout
*/

use std::time::Duration;

use url::Url;

use crate::error::{Result, WalletError};

/// Default wallet deployment
const DEFAULT_WALLET_BASE_URL: &str = "https://wallet.nearprotocol.com";
const DEFAULT_APP_KEY_PREFIX: &str = "default";
const LOGIN_PATH: &str = "/login/";
const EMBED_PATH: &str = "/embed/";
const AUTH_KEY_SUFFIX: &str = "_wallet_auth_key";

/// Wallet client configuration
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Base URL of the wallet; its origin is the only trusted message origin
    pub wallet_base_url: String,
    /// Scope for the persisted session record
    pub app_key_prefix: String,
    /// Deadline for a single signing round trip; `None` waits forever
    pub request_timeout: Option<Duration>,
    /// Buffer size of the inbound message queue
    pub inbound_capacity: usize,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            wallet_base_url: DEFAULT_WALLET_BASE_URL.to_string(),
            app_key_prefix: DEFAULT_APP_KEY_PREFIX.to_string(),
            request_timeout: None,
            inbound_capacity: 100,
        }
    }
}

impl WalletConfig {
    /// Create a config for the given wallet and app prefix, other fields default
    pub fn new(wallet_base_url: impl Into<String>, app_key_prefix: impl Into<String>) -> Self {
        Self {
            wallet_base_url: wallet_base_url.into(),
            app_key_prefix: app_key_prefix.into(),
            ..Self::default()
        }
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Check the configuration before wiring a client
    pub fn validate(&self) -> Result<()> {
        let base = self.base_url()?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(WalletError::Config(format!(
                "wallet_base_url must be http(s), got {}",
                base.scheme()
            )));
        }
        if base.host_str().is_none() {
            return Err(WalletError::Config(
                "wallet_base_url must have a host".to_string(),
            ));
        }
        if self.app_key_prefix.trim().is_empty() {
            return Err(WalletError::Config(
                "app_key_prefix cannot be empty".to_string(),
            ));
        }
        if self.inbound_capacity == 0 {
            return Err(WalletError::Config(
                "inbound_capacity must be positive".to_string(),
            ));
        }
        if self.request_timeout == Some(Duration::ZERO) {
            return Err(WalletError::Config(
                "request_timeout must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed wallet base URL
    pub fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.wallet_base_url)?)
    }

    /// Serialized origin (scheme://host[:port]) of the wallet
    pub fn wallet_origin(&self) -> Result<String> {
        Ok(self.base_url()?.origin().ascii_serialization())
    }

    /// Wallet login endpoint used for the sign-in redirect
    pub fn login_url(&self) -> Result<Url> {
        self.endpoint(LOGIN_PATH)
    }

    /// Wallet embed endpoint the hidden frame points at
    pub fn embed_url(&self) -> Result<Url> {
        self.endpoint(EMBED_PATH)
    }

    /// Storage key holding the session record
    pub fn auth_key(&self) -> String {
        format!("{}{}", self.app_key_prefix, AUTH_KEY_SUFFIX)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        // Keep any path prefix on the base URL (e.g. https://host/wallet).
        let base = self.wallet_base_url.trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }
}
