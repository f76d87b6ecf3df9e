/*
[INPUT]:  Transaction, sender account id, active session
[OUTPUT]: Wallet signature or the wallet's error payload
[POS]:    Signer layer - public remote signing operation
[UPDATE]: When adding wallet actions or changing authorization rules
*/

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::auth::Session;
use crate::channel::MessageChannel;
use crate::error::{Result, WalletError};
use crate::types::{AuthData, OutboundAction, SignOutcome, Transaction};

use super::RequestCorrelator;

/// Signs transactions by round-tripping them through the wallet frame
#[derive(Debug, Clone)]
pub struct RemoteSigner {
    session: Session,
    channel: Arc<MessageChannel>,
    correlator: Arc<RequestCorrelator>,
    request_timeout: Option<Duration>,
}

impl RemoteSigner {
    pub fn new(
        session: Session,
        channel: Arc<MessageChannel>,
        correlator: Arc<RequestCorrelator>,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            session,
            channel,
            correlator,
            request_timeout,
        }
    }

    /// Ask the wallet to sign `tx` on behalf of `sender_account_id`
    ///
    /// 1. Check the session is signed in as `sender_account_id`
    /// 2. Decode method name and arguments from the function call
    /// 3. Register, then post a `sign_transaction` action
    /// 4. Wait for the matching response (bounded by the request timeout)
    ///
    /// Nothing is posted when step 1 or 2 fails, or once the client has shut
    /// down. Dropping the returned future releases the pending request.
    pub async fn sign_transaction(
        &self,
        tx: &Transaction,
        sender_account_id: &str,
    ) -> Result<serde_json::Value> {
        let auth_data = self.authorize(sender_account_id)?;
        let payload = tx.signing_payload()?;
        if self.correlator.is_closed() {
            return Err(WalletError::ChannelClosed);
        }

        let request_id = self.correlator.next_request_id();
        let action = OutboundAction::SignTransaction {
            token: auth_data.auth_token,
            method_name: payload.method_name,
            args: payload.args,
            hash: payload.hash,
            request_id: request_id.clone(),
        };

        let response_rx = self.correlator.register(&request_id);
        let mut pending = PendingGuard::new(&self.correlator, &request_id);

        self.channel.send(&action).await?;
        debug!(request_id = %request_id, hash = %payload.hash, "sign request dispatched");

        let received = match self.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, response_rx).await {
                Ok(received) => received,
                Err(_) => {
                    let duration_ms = duration_ms(limit);
                    warn!(request_id = %request_id, timeout_ms = duration_ms, "wallet did not respond");
                    return Err(WalletError::Timeout { duration_ms });
                }
            },
            None => response_rx.await,
        };
        pending.disarm();

        match received {
            Ok(SignOutcome::Success(signature)) => {
                info!(request_id = %request_id, "transaction signed");
                Ok(signature)
            }
            Ok(SignOutcome::Failure(error)) => {
                info!(request_id = %request_id, error = %error, "wallet rejected signing");
                Err(WalletError::RemoteSigning(error))
            }
            Err(_) => Err(WalletError::ChannelClosed),
        }
    }

    fn authorize(&self, sender_account_id: &str) -> Result<AuthData> {
        let auth_data = self
            .session
            .auth_data()
            .filter(AuthData::is_active)
            .ok_or_else(|| WalletError::unauthorized("not signed in"))?;

        if auth_data.account_id != sender_account_id {
            return Err(WalletError::unauthorized(format!(
                "signed in as {}, cannot sign for {sender_account_id}",
                auth_data.account_id
            )));
        }
        Ok(auth_data)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Removes a pending request unless the round trip finished
struct PendingGuard<'a> {
    correlator: &'a RequestCorrelator,
    request_id: &'a str,
    armed: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(correlator: &'a RequestCorrelator, request_id: &'a str) -> Self {
        Self {
            correlator,
            request_id,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed && self.correlator.cancel(self.request_id) {
            debug!(request_id = self.request_id, "pending sign request released");
        }
    }
}
