/*
[INPUT]:  Loaded CLI configuration and per-command arguments
[OUTPUT]: Sign-in URLs, session state changes and wallet signatures
[POS]:    Command layer - drives the wallet client for each subcommand
[UPDATE]: When adding subcommands or changing how the client is wired
*/

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{info, warn};
use url::Url;
use wallet_bridge_adapter::{
    AuthData, FileStore, FrameTransport, MemoryFrame, Transaction, WalletClient, WebSocketFrame,
};

use crate::config::CliConfig;

/// Signed-in state as reported by `status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub signed_in: bool,
    pub account_id: String,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.signed_in {
            write!(f, "signed in as {}", self.account_id)
        } else {
            write!(f, "signed out")
        }
    }
}

/// Client over the file-backed session store and the given frame
fn open_client(config: &CliConfig, transport: Arc<dyn FrameTransport>) -> Result<WalletClient> {
    let storage_dir = config.storage_dir()?;
    let store = Arc::new(FileStore::new(&storage_dir));
    let client = WalletClient::new(config.wallet_config(), config.page_url()?, store, transport)
        .context("create wallet client")?;
    info!(storage_dir = %storage_dir.display(), "session store opened");
    Ok(client)
}

/// Client for commands that never talk to the wallet frame
fn open_offline_client(config: &CliConfig) -> Result<WalletClient> {
    let wallet = config.wallet_config();
    let embed_url = wallet.embed_url().context("derive embed url")?;
    let frame = MemoryFrame::new(embed_url, wallet.inbound_capacity);
    open_client(config, Arc::new(frame))
}

pub fn sign_in_url(
    config: &CliConfig,
    success_url: Option<&str>,
    failure_url: Option<&str>,
) -> Result<Url> {
    let client = open_offline_client(config)?;
    Ok(client.request_sign_in(
        &config.app.contract_id,
        &config.app.title,
        success_url,
        failure_url,
    ))
}

/// Persist the session carried by a wallet return URL
pub fn complete_sign_in(config: &CliConfig, return_url: &str) -> Result<AuthData> {
    let return_url =
        Url::parse(return_url).with_context(|| format!("invalid return url: {return_url}"))?;
    let client = open_offline_client(config)?;
    client
        .complete_sign_in(&return_url)
        .context("store session")?
        .ok_or_else(|| anyhow!("return url carries no account_id/auth_token"))
}

pub fn status(config: &CliConfig) -> Result<Status> {
    let client = open_offline_client(config)?;
    Ok(Status {
        signed_in: client.is_signed_in(),
        account_id: client.account_id(),
    })
}

pub fn sign_out(config: &CliConfig) -> Result<()> {
    let client = open_offline_client(config)?;
    client.sign_out().context("clear session")
}

/// Read a JSON transaction file
pub fn load_transaction(path: &Path) -> Result<Transaction> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read transaction {}", path.display()))?;
    serde_json::from_str(&content).context("parse transaction json")
}

/// Have the wallet sign the transaction in `tx_path` over its embed socket
///
/// Ctrl-C abandons the request.
pub async fn sign(config: &CliConfig, tx_path: &Path, sender: &str) -> Result<serde_json::Value> {
    let tx = load_transaction(tx_path)?;
    if !open_offline_client(config)?.is_signed_in() {
        bail!("not signed in; run sign-in-url and complete-sign-in first");
    }

    let wallet = config.wallet_config();
    let embed_url = wallet.embed_url().context("derive embed url")?;
    let frame = WebSocketFrame::connect(&embed_url, wallet.inbound_capacity)
        .await
        .context("connect wallet frame")?;
    let client = open_client(config, Arc::new(frame))?;

    info!(sender, receiver = %tx.receiver_id, hash = %tx.hash, "requesting wallet signature");
    tokio::select! {
        result = client.sign_transaction(&tx, sender) => {
            result.context("wallet signing")
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("received SIGINT; abandoning signing request");
            client.shutdown();
            bail!("signing interrupted")
        }
    }
}
