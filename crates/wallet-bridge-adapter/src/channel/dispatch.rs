/*
[INPUT]:  Outbound actions and raw inbound frame messages
[OUTPUT]: Origin-targeted posts and origin-filtered responses fed to the correlator
[POS]:    Channel layer - the trust boundary between the wallet frame and the client
[UPDATE]: When changing origin policy or inbound decoding
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::Result;
use crate::signer::RequestCorrelator;
use crate::types::InboundResponse;

use super::frame::{FrameTransport, InboundMessage};

const UNTRUSTED_LOG_LIMIT: usize = 5;
const PARSE_FAIL_LOG_LIMIT: usize = 5;
const RAW_LOG_MAX_BYTES: usize = 1024;

static UNTRUSTED_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);
static PARSE_FAIL_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

/// What happened to an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Origin did not match the wallet; dropped silently
    UntrustedOrigin,
    /// Body was not a valid response; logged and dropped
    Malformed,
    /// Valid response for no pending request; logged and dropped
    Unmatched,
    /// Completed a pending request
    Delivered,
}

/// Sends JSON to the wallet frame and filters what comes back
#[derive(Debug)]
pub struct MessageChannel {
    transport: Arc<dyn FrameTransport>,
    wallet_origin: String,
    correlator: Arc<RequestCorrelator>,
}

impl MessageChannel {
    pub fn new(
        transport: Arc<dyn FrameTransport>,
        wallet_origin: impl Into<String>,
        correlator: Arc<RequestCorrelator>,
    ) -> Self {
        Self {
            transport,
            wallet_origin: wallet_origin.into(),
            correlator,
        }
    }

    pub fn wallet_origin(&self) -> &str {
        &self.wallet_origin
    }

    /// JSON-encode `payload` and post it, targeting the wallet origin only
    pub async fn send<T: Serialize + ?Sized>(&self, payload: &T) -> Result<()> {
        let body = serde_json::to_string(payload)?;
        debug!(
            bytes = body.len(),
            frame = %self.transport.frame_url(),
            "posting message to wallet frame"
        );
        self.transport.post(body, &self.wallet_origin).await
    }

    /// Apply the origin filter, decode, and hand the response to the correlator
    pub fn handle_inbound(&self, message: InboundMessage) -> Disposition {
        if message.origin != self.wallet_origin {
            log_untrusted_once(&message.origin, message.data.len());
            return Disposition::UntrustedOrigin;
        }

        let response = match serde_json::from_str::<InboundResponse>(&message.data) {
            Ok(response) => response,
            Err(err) => {
                log_parse_fail_once(&err, &message.data);
                return Disposition::Malformed;
            }
        };

        if self.correlator.resolve_incoming(response) {
            Disposition::Delivered
        } else {
            Disposition::Unmatched
        }
    }

    /// Drain `inbound` on a background task until the frame closes
    ///
    /// A closed frame closes the correlator: pending and later requests fail
    /// with `ChannelClosed`.
    pub fn spawn_listener(
        self: &Arc<Self>,
        mut inbound: mpsc::Receiver<InboundMessage>,
    ) -> JoinHandle<()> {
        let channel = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(message) = inbound.recv().await {
                channel.handle_inbound(message);
            }
            let cancelled = channel.correlator.close();
            info!(
                origin = %channel.wallet_origin,
                cancelled,
                "wallet frame listener stopped"
            );
        })
    }
}

fn log_untrusted_once(origin: &str, bytes: usize) {
    let count = UNTRUSTED_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < UNTRUSTED_LOG_LIMIT {
        debug!(
            sample_index = count + 1,
            sample_limit = UNTRUSTED_LOG_LIMIT,
            origin,
            bytes,
            "message from untrusted origin ignored"
        );
    }
}

fn log_parse_fail_once(err: &serde_json::Error, raw: &str) {
    let count = PARSE_FAIL_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < PARSE_FAIL_LOG_LIMIT {
        info!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            "wallet message parse failed"
        );
        let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
        debug!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            message = %preview,
            "wallet message parse failed"
        );
    }
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use url::Url;

    use crate::channel::MemoryFrame;
    use crate::types::SignOutcome;

    const WALLET: &str = "https://wallet.example";

    fn channel() -> (Arc<MessageChannel>, MemoryFrame, Arc<RequestCorrelator>) {
        let frame = MemoryFrame::new(Url::parse("https://wallet.example/embed/").unwrap(), 8);
        let correlator = Arc::new(RequestCorrelator::new());
        let channel = Arc::new(MessageChannel::new(
            Arc::new(frame.clone()),
            WALLET,
            correlator.clone(),
        ));
        (channel, frame, correlator)
    }

    fn response(request_id: &str) -> String {
        json!({"request_id": request_id, "success": true, "result": "SIG"}).to_string()
    }

    #[tokio::test]
    async fn test_send_targets_wallet_origin() {
        let (channel, frame, _) = channel();
        channel.send(&json!({"action": "ping"})).await.unwrap();
        assert_eq!(frame.posted(), vec![r#"{"action":"ping"}"#.to_string()]);
    }

    #[tokio::test]
    async fn test_origin_filter_runs_before_correlation() {
        let (channel, _, correlator) = channel();
        let mut rx = correlator.register("R");

        for origin in [
            "https://evil.example",
            "http://wallet.example",
            "https://wallet.example:8443",
            "https://wallet.example.evil",
        ] {
            let disposition = channel.handle_inbound(InboundMessage::new(origin, response("R")));
            assert_eq!(disposition, Disposition::UntrustedOrigin);
        }

        assert!(correlator.is_pending("R"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_malformed_and_unmatched_are_absorbed() {
        let (channel, _, correlator) = channel();
        let _rx = correlator.register("R");

        assert_eq!(
            channel.handle_inbound(InboundMessage::new(WALLET, "{not json")),
            Disposition::Malformed
        );
        assert_eq!(
            channel.handle_inbound(InboundMessage::new(WALLET, r#"{"hello":"world"}"#)),
            Disposition::Malformed
        );
        assert_eq!(
            channel.handle_inbound(InboundMessage::new(WALLET, response("other"))),
            Disposition::Unmatched
        );
        assert!(correlator.is_pending("R"));
    }

    #[tokio::test]
    async fn test_listener_delivers_trusted_response() {
        let (channel, frame, correlator) = channel();
        let rx = correlator.register("R");
        let handle = channel.spawn_listener(frame.take_receiver().unwrap());

        frame.deliver("https://evil.example", response("R")).await.unwrap();
        frame.deliver(WALLET, response("R")).await.unwrap();

        assert_eq!(rx.await.unwrap(), SignOutcome::Success(json!("SIG")));
        handle.abort();
    }

    #[tokio::test]
    async fn test_closed_frame_fails_pending_requests() {
        let (channel, _, correlator) = channel();
        let rx = correlator.register("R");
        let (inbound_tx, inbound_rx) = mpsc::channel(1);
        let handle = channel.spawn_listener(inbound_rx);

        drop(inbound_tx);
        handle.await.unwrap();

        assert!(rx.await.is_err());
        assert!(correlator.is_closed());
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(truncate_for_log("abcdef", 3), "abc...");
        assert_eq!(truncate_for_log("ééé", 3), "é...");
    }
}
