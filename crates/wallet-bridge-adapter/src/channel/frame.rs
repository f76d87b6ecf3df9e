/*
[INPUT]:  Serialized message bodies and explicit target origins
[OUTPUT]: Frame transport abstraction and an in-process frame
[POS]:    Channel layer - seam between the client and the wallet's embed endpoint
[UPDATE]: When adding transports or changing delivery semantics
*/

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

use crate::error::{Result, WalletError};

/// A message as the platform hands it to the listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Origin of the sending context, e.g. `https://wallet.example`
    pub origin: String,
    /// Raw message body
    pub data: String,
}

impl InboundMessage {
    pub fn new(origin: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            data: data.into(),
        }
    }
}

/// Isolated channel to the wallet's embedded endpoint
///
/// Implementations must drop a post whose `target_origin` differs from the
/// frame's current origin instead of delivering it elsewhere.
#[async_trait]
pub trait FrameTransport: Send + Sync + fmt::Debug {
    /// URL the frame was opened on
    fn frame_url(&self) -> &Url;

    /// Take the inbound message stream; yields `Some` once
    fn take_receiver(&self) -> Option<mpsc::Receiver<InboundMessage>>;

    /// Post a body to the frame's content window
    async fn post(&self, body: String, target_origin: &str) -> Result<()>;
}

/// Wallet-side handler that answers posted bodies
pub trait FrameResponder: Send + Sync {
    /// Reply body for a posted message, `None` to stay silent
    fn respond(&self, body: &str) -> Option<String>;
}

/// In-process frame for tests and loopback setups
///
/// Records every delivered post; an optional responder answers from the
/// frame's current origin, and [`MemoryFrame::deliver`] injects messages from
/// any origin.
#[derive(Clone)]
pub struct MemoryFrame {
    inner: Arc<MemoryFrameInner>,
}

struct MemoryFrameInner {
    frame_url: Url,
    current_origin: Mutex<String>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: Mutex<Option<mpsc::Receiver<InboundMessage>>>,
    posted: Mutex<Vec<String>>,
    responder: Mutex<Option<Arc<dyn FrameResponder>>>,
}

impl MemoryFrame {
    pub fn new(frame_url: Url, capacity: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let current_origin = frame_url.origin().ascii_serialization();
        Self {
            inner: Arc::new(MemoryFrameInner {
                frame_url,
                current_origin: Mutex::new(current_origin),
                inbound_tx,
                inbound_rx: Mutex::new(Some(inbound_rx)),
                posted: Mutex::new(Vec::new()),
                responder: Mutex::new(None),
            }),
        }
    }

    /// Answer delivered posts with `responder`
    pub fn with_responder(self, responder: Arc<dyn FrameResponder>) -> Self {
        *lock(&self.inner.responder) = Some(responder);
        self
    }

    /// Simulate the frame navigating to another document
    pub fn navigate(&self, url: &Url) {
        *lock(&self.inner.current_origin) = url.origin().ascii_serialization();
    }

    /// Current origin of the frame's document
    pub fn current_origin(&self) -> String {
        lock(&self.inner.current_origin).clone()
    }

    /// Bodies delivered to the frame so far
    pub fn posted(&self) -> Vec<String> {
        lock(&self.inner.posted).clone()
    }

    /// Inject a message as if posted from `origin`
    pub async fn deliver(&self, origin: &str, data: impl Into<String>) -> Result<()> {
        self.inner
            .inbound_tx
            .send(InboundMessage::new(origin, data))
            .await
            .map_err(|_| WalletError::Transport("frame listener is gone".to_string()))
    }
}

#[async_trait]
impl FrameTransport for MemoryFrame {
    fn frame_url(&self) -> &Url {
        &self.inner.frame_url
    }

    fn take_receiver(&self) -> Option<mpsc::Receiver<InboundMessage>> {
        lock(&self.inner.inbound_rx).take()
    }

    async fn post(&self, body: String, target_origin: &str) -> Result<()> {
        let origin = self.current_origin();
        if origin != target_origin {
            debug!(target_origin, frame_origin = %origin, "post dropped: frame origin mismatch");
            return Ok(());
        }

        lock(&self.inner.posted).push(body.clone());

        let responder = lock(&self.inner.responder).clone();
        if let Some(reply) = responder.and_then(|responder| responder.respond(&body)) {
            self.deliver(&origin, reply).await?;
        }
        Ok(())
    }
}

impl fmt::Debug for MemoryFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFrame")
            .field("frame_url", &self.inner.frame_url.as_str())
            .field("current_origin", &self.current_origin())
            .field("posted", &lock(&self.inner.posted).len())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
