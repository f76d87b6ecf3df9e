/*
[INPUT]:  Wallet config, current page URL, key-value store and frame transport
[OUTPUT]: Application-facing sign-in, sign-out and signing operations
[POS]:    Composition root - owns the session and wires channel into correlator
[UPDATE]: When public operations or component wiring change
*/

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tracing::{info, warn};
use url::Url;

use crate::auth::{AuthFlow, KeyValueStore, Session, SessionStore};
use crate::channel::{FrameTransport, MessageChannel};
use crate::config::WalletConfig;
use crate::error::{Result, WalletError};
use crate::signer::{RemoteSigner, RequestCorrelator};
use crate::types::{AuthData, Transaction};

/// Wallet-backed account for an embedding application
///
/// Construction restores a persisted session, or completes a sign-in when
/// `page_url` is a wallet return URL, then starts listening to the frame.
/// Must be created inside a Tokio runtime.
#[derive(Debug)]
pub struct WalletClient {
    config: WalletConfig,
    session: Session,
    auth_flow: AuthFlow,
    signer: RemoteSigner,
    correlator: Arc<RequestCorrelator>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl WalletClient {
    pub fn new(
        config: WalletConfig,
        page_url: Url,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn FrameTransport>,
    ) -> Result<Self> {
        config.validate()?;
        let wallet_origin = config.wallet_origin()?;

        let embed_url = config.embed_url()?;
        if transport.frame_url() != &embed_url {
            warn!(
                frame_url = %transport.frame_url(),
                embed_url = %embed_url,
                "frame transport is not opened on the wallet embed endpoint"
            );
        }
        let inbound = transport
            .take_receiver()
            .ok_or_else(|| WalletError::Config("frame receiver already taken".to_string()))?;

        let session = Session::new();
        let auth_flow = AuthFlow::new(
            &config,
            page_url.clone(),
            session.clone(),
            SessionStore::new(store),
        )?;
        if auth_flow.restore().is_none() {
            auth_flow.complete_sign_in_from_return_url(&page_url)?;
        }

        let correlator = Arc::new(RequestCorrelator::new());
        let channel = Arc::new(MessageChannel::new(
            transport,
            wallet_origin,
            correlator.clone(),
        ));
        let listener = channel.spawn_listener(inbound);
        let signer = RemoteSigner::new(
            session.clone(),
            channel,
            correlator.clone(),
            config.request_timeout,
        );

        info!(
            wallet = %config.wallet_base_url,
            signed_in = session.is_signed_in(),
            "wallet client ready"
        );

        Ok(Self {
            config,
            session,
            auth_flow,
            signer,
            correlator,
            listener: Mutex::new(Some(listener)),
        })
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_signed_in()
    }

    /// Signed-in account id, empty when signed out
    pub fn account_id(&self) -> String {
        self.session.account_id().unwrap_or_default()
    }

    /// Active session record
    pub fn auth_data(&self) -> Option<AuthData> {
        self.session.auth_data().filter(AuthData::is_active)
    }

    /// URL to send the user to for signing in
    pub fn request_sign_in(
        &self,
        contract_id: &str,
        title: &str,
        success_url: Option<&str>,
        failure_url: Option<&str>,
    ) -> Url {
        self.auth_flow
            .build_sign_in_url(contract_id, title, success_url, failure_url)
    }

    /// Commit credentials from a wallet return URL
    pub fn complete_sign_in(&self, url: &Url) -> Result<Option<AuthData>> {
        self.auth_flow.complete_sign_in_from_return_url(url)
    }

    pub fn sign_out(&self) -> Result<()> {
        self.auth_flow.sign_out()
    }

    /// Have the wallet sign `tx` for `sender_account_id`
    pub async fn sign_transaction(
        &self,
        tx: &Transaction,
        sender_account_id: &str,
    ) -> Result<serde_json::Value> {
        self.signer.sign_transaction(tx, sender_account_id).await
    }

    /// Requests still waiting for the wallet
    pub fn pending_requests(&self) -> usize {
        self.correlator.pending_count()
    }

    /// Stop listening; pending and later requests fail with `ChannelClosed`
    pub fn shutdown(&self) {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(listener) = listener {
            listener.abort();
        }
        let cancelled = self.correlator.close();
        info!(cancelled, "wallet client shut down");
    }
}

impl Drop for WalletClient {
    fn drop(&mut self) {
        if let Some(listener) = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            listener.abort();
        }
    }
}
