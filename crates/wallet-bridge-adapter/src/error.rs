/*
[INPUT]:  Error sources (authorization, transaction decoding, transport, wallet replies)
[OUTPUT]: Structured error types with auth and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;

/// Main error type for the wallet bridge
#[derive(Error, Debug)]
pub enum WalletError {
    /// Signing requested while signed out or for a different account
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Transaction payload could not be decoded into a signing request
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    /// Wallet answered with `success: false`; payload kept verbatim
    #[error("Remote signing failed: {0}")]
    RemoteSigning(serde_json::Value),

    /// No response arrived within the configured request timeout
    #[error("Wallet did not respond within {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Pending request was dropped before completion (shutdown or id collision)
    #[error("Request channel closed before a response arrived")]
    ChannelClosed,

    /// Frame transport failed to deliver or connect
    #[error("Transport error: {0}")]
    Transport(String),

    /// Persistent store failed to write
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WalletError {
    /// Build an unauthorized error with a message
    pub fn unauthorized(message: impl Into<String>) -> Self {
        WalletError::Unauthorized {
            message: message.into(),
        }
    }

    /// Check if the error is retryable
    ///
    /// Remote failures are not retryable: the wallet already made a decision.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WalletError::Timeout { .. } | WalletError::Transport(_) | WalletError::ChannelClosed
        )
    }

    /// Check if error indicates an authorization failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self, WalletError::Unauthorized { .. })
    }

    /// Wallet-supplied error payload, if the wallet rejected the request
    pub fn remote_payload(&self) -> Option<&serde_json::Value> {
        match self {
            WalletError::RemoteSigning(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Result type alias for wallet bridge operations
pub type Result<T> = std::result::Result<T, WalletError>;
