/*
[INPUT]:  JSON bodies exchanged with the wallet frame
[OUTPUT]: Tagged outbound actions and checked inbound responses
[POS]:    Data layer - embedded-frame wire protocol
[UPDATE]: When adding wallet actions or changing response fields
*/

use serde::{Deserialize, Serialize};

use super::CryptoHash;

/// Messages the client posts to the wallet frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OutboundAction {
    SignTransaction {
        token: String,
        method_name: String,
        args: serde_json::Value,
        hash: CryptoHash,
        request_id: String,
    },
}

impl OutboundAction {
    pub fn request_id(&self) -> &str {
        match self {
            OutboundAction::SignTransaction { request_id, .. } => request_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutboundAction::SignTransaction { .. } => "sign_transaction",
        }
    }
}

/// Response the wallet posts back for a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundResponse {
    pub request_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl InboundResponse {
    pub fn success(request_id: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            request_id: request_id.into(),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(request_id: impl Into<String>, error: serde_json::Value) -> Self {
        Self {
            request_id: request_id.into(),
            success: false,
            result: None,
            error: Some(error),
        }
    }

    /// Split into the correlation id and the outcome it carries
    pub fn into_outcome(self) -> (String, SignOutcome) {
        let outcome = if self.success {
            SignOutcome::Success(self.result.unwrap_or(serde_json::Value::Null))
        } else {
            SignOutcome::Failure(self.error.unwrap_or(serde_json::Value::Null))
        };
        (self.request_id, outcome)
    }
}

/// Completed result of a remote request
#[derive(Debug, Clone, PartialEq)]
pub enum SignOutcome {
    Success(serde_json::Value),
    Failure(serde_json::Value),
}
