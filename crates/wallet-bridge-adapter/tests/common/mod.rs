/*
[INPUT]:  Test configuration and loopback wallet requirements
[OUTPUT]: Shared test utilities, fixtures, and client builders
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for wallet-bridge-adapter tests

use std::sync::Arc;

use url::Url;
use wallet_bridge_adapter::{
    Action, CryptoHash, FunctionCallAction, KeyValueStore, LocalWallet, MemoryFrame, Transaction,
    WalletClient, WalletConfig, WalletKey,
};

#[allow(dead_code)]
pub const WALLET_BASE: &str = "https://wallet.example";
#[allow(dead_code)]
pub const APP_PREFIX: &str = "demo";

#[allow(dead_code)]
pub fn wallet_config() -> WalletConfig {
    WalletConfig::new(WALLET_BASE, APP_PREFIX)
}

pub fn page_url(raw: &str) -> Url {
    Url::parse(raw).expect("valid page url")
}

/// Frame on the wallet embed endpoint with no wallet answering
#[allow(dead_code)]
pub fn silent_frame() -> MemoryFrame {
    MemoryFrame::new(wallet_config().embed_url().unwrap(), 16)
}

/// Frame answered by a loopback wallet for alice.near / T1
#[allow(dead_code)]
pub fn loopback_frame() -> (MemoryFrame, Arc<LocalWallet>) {
    let wallet = Arc::new(LocalWallet::new(
        "alice.near",
        "T1",
        WalletKey::from_secret_key(&[42u8; 32]),
    ));
    let frame = silent_frame().with_responder(wallet.clone());
    (frame, wallet)
}

/// Client already signed in as alice.near through its page URL
#[allow(dead_code)]
pub fn signed_in_client(
    config: WalletConfig,
    store: Arc<dyn KeyValueStore>,
    frame: MemoryFrame,
) -> WalletClient {
    let page = page_url("https://app.example/cb?auth_token=T1&account_id=alice.near");
    WalletClient::new(config, page, store, Arc::new(frame)).expect("client builds")
}

/// Function-call transaction from alice.near
#[allow(dead_code)]
pub fn sample_transaction(seed: u8) -> Transaction {
    Transaction {
        signer_id: "alice.near".to_string(),
        receiver_id: "guest-book.near".to_string(),
        nonce: u64::from(seed),
        hash: CryptoHash([seed; 32]),
        actions: vec![Action::FunctionCall(
            FunctionCallAction::new("add_message", &serde_json::json!({"text": "hello"}))
                .expect("encode args"),
        )],
    }
}

/// Wait until the frame has recorded `count` posts
#[allow(dead_code)]
pub async fn wait_for_posts(frame: &MemoryFrame, count: usize) -> Vec<String> {
    loop {
        let posted = frame.posted();
        if posted.len() >= count {
            return posted;
        }
        tokio::task::yield_now().await;
    }
}

/// Request id carried by a posted body
#[allow(dead_code)]
pub fn request_id_of(body: &str) -> String {
    let value: serde_json::Value = serde_json::from_str(body).expect("posted body is json");
    value["request_id"]
        .as_str()
        .expect("request_id present")
        .to_string()
}
