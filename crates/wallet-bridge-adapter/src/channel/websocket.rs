/*
[INPUT]:  Wallet embed URL and posted message bodies
[OUTPUT]: Frame transport over a WebSocket connection to the wallet
[POS]:    Channel layer - networked rendition of the hidden embedded frame
[UPDATE]: When changing connection logic or origin stamping
*/

use std::sync::{Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Result, WalletError};

use super::frame::{FrameTransport, InboundMessage};

/// Frame transport backed by a WebSocket to the wallet's embed endpoint
///
/// Every inbound frame is stamped with the origin of the endpoint the socket
/// is connected to.
#[derive(Debug)]
pub struct WebSocketFrame {
    frame_url: Url,
    frame_origin: String,
    outbound_tx: Mutex<Option<mpsc::Sender<WsMessage>>>,
    inbound_rx: StdMutex<Option<mpsc::Receiver<InboundMessage>>>,
}

impl WebSocketFrame {
    /// Connect to `embed_url` (http/https are mapped to ws/wss)
    pub async fn connect(embed_url: &Url, capacity: usize) -> Result<Self> {
        let socket_url = socket_url(embed_url)?;
        let frame_origin = embed_url.origin().ascii_serialization();

        let (ws_stream, _response) = connect_async(socket_url.as_str())
            .await
            .map_err(|e| WalletError::Transport(format!("connect {socket_url}: {e}")))?;
        let (mut write, mut read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<WsMessage>(capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);

        info!(url = %socket_url, origin = %frame_origin, "wallet frame connected");

        let origin = frame_origin.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outbound = outbound_rx.recv() => {
                        match outbound {
                            Some(message) => {
                                if write.send(message).await.is_err() {
                                    break;
                                }
                            }
                            None => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                        }
                    }
                    incoming = read.next() => {
                        match incoming {
                            Some(Ok(WsMessage::Close(_))) => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                            Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => {}
                            Some(Ok(message)) => {
                                if let Some(data) = message_text(message)
                                    && inbound_tx
                                        .send(InboundMessage::new(origin.clone(), data))
                                        .await
                                        .is_err()
                                {
                                    break;
                                }
                            }
                            Some(Err(err)) => {
                                warn!(error = %err, "wallet frame read failed");
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }
            debug!(origin = %origin, "wallet frame closed");
        });

        Ok(Self {
            frame_url: embed_url.clone(),
            frame_origin,
            outbound_tx: Mutex::new(Some(outbound_tx)),
            inbound_rx: StdMutex::new(Some(inbound_rx)),
        })
    }

    /// Origin the socket is connected to
    pub fn frame_origin(&self) -> &str {
        &self.frame_origin
    }

    /// Close the connection; later posts fail
    pub async fn close(&self) {
        let mut guard = self.outbound_tx.lock().await;
        *guard = None;
    }
}

#[async_trait]
impl FrameTransport for WebSocketFrame {
    fn frame_url(&self) -> &Url {
        &self.frame_url
    }

    fn take_receiver(&self) -> Option<mpsc::Receiver<InboundMessage>> {
        self.inbound_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    async fn post(&self, body: String, target_origin: &str) -> Result<()> {
        if target_origin != self.frame_origin {
            debug!(
                target_origin,
                frame_origin = %self.frame_origin,
                "post dropped: frame origin mismatch"
            );
            return Ok(());
        }

        let sender = {
            let guard = self.outbound_tx.lock().await;
            guard
                .clone()
                .ok_or_else(|| WalletError::Transport("wallet frame not connected".to_string()))?
        };

        sender
            .send(WsMessage::Text(body.into()))
            .await
            .map_err(|_| WalletError::Transport("wallet frame send channel closed".to_string()))
    }
}

fn socket_url(embed_url: &Url) -> Result<Url> {
    let scheme = match embed_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(WalletError::Config(format!(
                "unsupported embed url scheme: {other}"
            )));
        }
    };
    let mut url = embed_url.clone();
    url.set_scheme(scheme)
        .map_err(|_| WalletError::Config(format!("cannot map {embed_url} to {scheme}")))?;
    Ok(url)
}

fn message_text(message: WsMessage) -> Option<String> {
    match message {
        WsMessage::Text(text) => Some(text.to_string()),
        WsMessage::Binary(bytes) => String::from_utf8(bytes.to_vec()).ok(),
        _ => None,
    }
}
