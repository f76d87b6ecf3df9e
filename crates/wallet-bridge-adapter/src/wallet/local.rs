/*
[INPUT]:  Posted wallet actions (JSON bodies)
[OUTPUT]: Wallet responses signed with a local Ed25519 key
[POS]:    Wallet side - loopback wallet for demos and tests
[UPDATE]: When the wire protocol gains actions or response fields
*/

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use tracing::debug;

use crate::channel::FrameResponder;
use crate::types::{InboundResponse, OutboundAction};

use super::WalletKey;

/// Wallet end of the frame protocol, backed by one account and one key
///
/// Accepts requests carrying the token it issued and answers with an
/// `ed25519:` signature over the transaction hash.
#[derive(Debug)]
pub struct LocalWallet {
    account_id: String,
    auth_token: String,
    key: WalletKey,
    handled: AtomicUsize,
}

impl LocalWallet {
    pub fn new(account_id: impl Into<String>, auth_token: impl Into<String>, key: WalletKey) -> Self {
        Self {
            account_id: account_id.into(),
            auth_token: auth_token.into(),
            key,
            handled: AtomicUsize::new(0),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn key(&self) -> &WalletKey {
        &self.key
    }

    /// Return URL query the wallet would redirect back with after login
    pub fn return_query(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("auth_token", &self.auth_token)
            .append_pair("account_id", &self.account_id)
            .finish()
    }

    /// Number of requests answered so far
    pub fn handled(&self) -> usize {
        self.handled.load(Ordering::Relaxed)
    }

    /// Answer one posted body; `None` when no request id can be recovered
    pub fn handle(&self, body: &str) -> Option<InboundResponse> {
        let action = match serde_json::from_str::<OutboundAction>(body) {
            Ok(action) => action,
            Err(err) => {
                debug!(error = %err, "wallet received unreadable action");
                let request_id = serde_json::from_str::<serde_json::Value>(body)
                    .ok()?
                    .get("request_id")?
                    .as_str()?
                    .to_string();
                return Some(InboundResponse::failure(
                    request_id,
                    json!({"type": "malformed_request", "message": err.to_string()}),
                ));
            }
        };

        self.handled.fetch_add(1, Ordering::Relaxed);
        match action {
            OutboundAction::SignTransaction {
                token,
                hash,
                request_id,
                method_name,
                ..
            } => {
                if token != self.auth_token {
                    return Some(InboundResponse::failure(
                        request_id,
                        json!({"type": "unauthorized", "message": "invalid auth token"}),
                    ));
                }
                debug!(request_id = %request_id, method_name = %method_name, "wallet signing hash");
                Some(InboundResponse::success(
                    request_id,
                    json!(self.key.sign_hash(&hash)),
                ))
            }
        }
    }
}

impl FrameResponder for LocalWallet {
    fn respond(&self, body: &str) -> Option<String> {
        let response = self.handle(body)?;
        serde_json::to_string(&response).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::CryptoHash;

    fn wallet() -> LocalWallet {
        LocalWallet::new("alice.near", "T1", WalletKey::from_secret_key(&[5u8; 32]))
    }

    fn request(token: &str) -> String {
        serde_json::to_string(&OutboundAction::SignTransaction {
            token: token.to_string(),
            method_name: "add".to_string(),
            args: json!({}),
            hash: CryptoHash([2u8; 32]),
            request_id: "R".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_signs_with_valid_token() {
        let wallet = wallet();
        let response = wallet.handle(&request("T1")).unwrap();

        assert!(response.success);
        assert_eq!(response.request_id, "R");
        let signature = response.result.unwrap();
        assert!(
            wallet
                .key()
                .verify_hash(&CryptoHash([2u8; 32]), signature.as_str().unwrap())
        );
        assert_eq!(wallet.handled(), 1);
    }

    #[test]
    fn test_rejects_bad_token() {
        let response = wallet().handle(&request("stolen")).unwrap();
        assert!(!response.success);
        assert_eq!(response.error.unwrap()["type"], "unauthorized");
    }

    #[test]
    fn test_malformed_action() {
        let wallet = wallet();
        let response = wallet
            .handle(r#"{"action":"unknown","request_id":"R"}"#)
            .unwrap();
        assert!(!response.success);
        assert_eq!(response.error.unwrap()["type"], "malformed_request");

        assert!(wallet.handle("garbage").is_none());
        assert_eq!(wallet.handled(), 0);
    }

    #[test]
    fn test_return_query() {
        let wallet = LocalWallet::new("alice.near", "T 1", WalletKey::generate());
        assert_eq!(wallet.return_query(), "auth_token=T+1&account_id=alice.near");
    }
}
