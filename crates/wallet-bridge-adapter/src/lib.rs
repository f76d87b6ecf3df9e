/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public wallet bridge crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod signer;
pub mod types;
pub mod wallet;

// Re-export commonly used types from auth
pub use auth::{AuthFlow, FileStore, KeyValueStore, MemoryStore, Session, SessionStore};

// Re-export commonly used types from channel
pub use channel::{
    Disposition,
    FrameResponder,
    FrameTransport,
    InboundMessage,
    MemoryFrame,
    MessageChannel,
    WebSocketFrame,
};

pub use client::WalletClient;
pub use config::WalletConfig;
pub use error::{Result, WalletError};
pub use signer::{RemoteSigner, RequestCorrelator};

// Re-export all types
pub use types::*;

pub use wallet::{LocalWallet, WalletKey};
