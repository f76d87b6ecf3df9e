/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed CLI configuration and derived wallet settings
[POS]:    Configuration layer - wallet, app identity and storage location
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use url::Url;
use wallet_bridge_adapter::WalletConfig;

const STORAGE_DIR_NAME: &str = "wallet-bridge";

/// Top-level configuration for the wallet bridge CLI
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    /// Wallet deployment to talk to
    #[serde(default)]
    pub wallet: WalletSection,
    /// Identity of the application requesting access
    pub app: AppSection,
    /// Directory holding the persisted session; defaults under the data dir
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

/// Wallet connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletSection {
    pub base_url: String,
    pub app_key_prefix: String,
    /// Signing round-trip deadline in milliseconds; absent waits forever
    pub request_timeout_ms: Option<u64>,
    pub inbound_capacity: usize,
}

impl Default for WalletSection {
    fn default() -> Self {
        let defaults = WalletConfig::default();
        Self {
            base_url: defaults.wallet_base_url,
            app_key_prefix: defaults.app_key_prefix,
            request_timeout_ms: None,
            inbound_capacity: defaults.inbound_capacity,
        }
    }
}

/// Application identity shown by the wallet
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppSection {
    /// URL the wallet redirects back to
    pub page_url: String,
    /// Contract the session is scoped to
    pub contract_id: String,
    #[serde(default)]
    pub title: String,
}

impl CliConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content).context("parse config yaml")?;
        Ok(config)
    }

    /// Library configuration for the wallet section
    pub fn wallet_config(&self) -> WalletConfig {
        let mut config = WalletConfig::new(&self.wallet.base_url, &self.wallet.app_key_prefix);
        config.inbound_capacity = self.wallet.inbound_capacity;
        if let Some(ms) = self.wallet.request_timeout_ms {
            config = config.with_request_timeout(Duration::from_millis(ms));
        }
        config
    }

    pub fn page_url(&self) -> Result<Url> {
        Url::parse(&self.app.page_url)
            .with_context(|| format!("invalid app.page_url: {}", self.app.page_url))
    }

    /// Session storage directory, falling back to the platform data dir
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.storage_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir().context("no platform data directory; set storage_dir")?;
        Ok(data_dir.join(STORAGE_DIR_NAME))
    }

    /// Check everything a command needs before touching the wallet
    pub fn validate(&self) -> Result<()> {
        self.wallet_config()
            .validate()
            .context("invalid wallet section")?;
        let page_url = self.page_url()?;
        if !matches!(page_url.scheme(), "http" | "https") {
            bail!("app.page_url must be http(s), got {}", page_url.scheme());
        }
        if self.app.contract_id.trim().is_empty() {
            bail!("app.contract_id cannot be empty");
        }
        Ok(())
    }
}
