/*
[INPUT]:  Return URLs, stores shared across client instances
[OUTPUT]: Test results for the sign-in state machine and persistence
[POS]:    Integration tests - session lifecycle
[UPDATE]: When sign-in flow or persistence changes
*/

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::{APP_PREFIX, page_url, silent_frame, wallet_config};
use rstest::rstest;
use tempfile::TempDir;
use tokio_test::assert_ok;
use wallet_bridge_adapter::{AuthData, FileStore, KeyValueStore, MemoryStore, WalletClient};

fn client(page: &str, store: Arc<dyn KeyValueStore>) -> WalletClient {
    assert_ok!(WalletClient::new(
        wallet_config(),
        page_url(page),
        store,
        Arc::new(silent_frame()),
    ))
}

#[tokio::test]
async fn test_sign_in_survives_reload() {
    let store = Arc::new(MemoryStore::new());

    let first = client(
        "https://app.example/cb?auth_token=T1&account_id=alice.near",
        store.clone(),
    );
    assert!(first.is_signed_in());
    assert_eq!(first.account_id(), "alice.near");
    drop(first);

    let reloaded = client("https://app.example/", store.clone());
    assert!(reloaded.is_signed_in());
    assert_eq!(reloaded.account_id(), "alice.near");
    assert_eq!(
        reloaded.auth_data(),
        Some(AuthData::new("alice.near", "T1"))
    );
    assert!(store.get(&format!("{APP_PREFIX}_wallet_auth_key")).is_some());
}

#[tokio::test]
async fn test_sign_out_is_durable() {
    let store = Arc::new(MemoryStore::new());
    let signed_in = client(
        "https://app.example/cb?auth_token=T1&account_id=alice.near",
        store.clone(),
    );

    assert_ok!(signed_in.sign_out());
    assert!(!signed_in.is_signed_in());
    assert!(store.get("demo_wallet_auth_key").is_none());
    assert_ok!(signed_in.sign_out());

    let reloaded = client("https://app.example/", store);
    assert!(!reloaded.is_signed_in());
}

#[rstest]
#[case("https://app.example/cb")]
#[case("https://app.example/cb?auth_token=T1")]
#[case("https://app.example/cb?account_id=alice.near")]
#[case("https://app.example/cb?auth_token=&account_id=")]
#[tokio::test]
async fn test_incomplete_return_url_keeps_signed_out(#[case] page: &str) {
    let store = Arc::new(MemoryStore::new());
    let client = client(page, store.clone());

    assert!(!client.is_signed_in());
    assert_eq!(client.account_id(), "");
    assert!(store.get("demo_wallet_auth_key").is_none());
}

#[tokio::test]
async fn test_complete_sign_in_after_redirect() {
    let client = client("https://app.example/start", Arc::new(MemoryStore::new()));

    let login = client.request_sign_in("guest-book.near", "Guest Book", None, None);
    let params: HashMap<_, _> = login.query_pairs().into_owned().collect();
    assert_eq!(login.as_str().split('?').next(), Some("https://wallet.example/login/"));
    assert_eq!(params["success_url"], "https://app.example/start");
    assert_eq!(params["app_url"], "https://app.example");
    assert!(!client.is_signed_in());

    let returned = page_url("https://app.example/start?account_id=bob.near&auth_token=T9");
    let auth = assert_ok!(client.complete_sign_in(&returned));
    assert_eq!(auth, Some(AuthData::new("bob.near", "T9")));
    assert_eq!(client.account_id(), "bob.near");
}

#[tokio::test]
async fn test_prefixes_are_isolated() {
    let store = Arc::new(MemoryStore::new());
    let _demo = client(
        "https://app.example/cb?auth_token=T1&account_id=alice.near",
        store.clone(),
    );

    let mut other_config = wallet_config();
    other_config.app_key_prefix = "other".to_string();
    let other = assert_ok!(WalletClient::new(
        other_config,
        page_url("https://app.example/"),
        store,
        Arc::new(silent_frame()),
    ));
    assert!(!other.is_signed_in());
}

#[tokio::test]
async fn test_file_store_session_survives_restart() {
    let dir = assert_ok!(TempDir::new());

    let first = client(
        "https://app.example/cb?auth_token=T1&account_id=alice.near",
        Arc::new(FileStore::new(dir.path())),
    );
    assert!(first.is_signed_in());
    drop(first);

    let restarted = client("https://app.example/", Arc::new(FileStore::new(dir.path())));
    assert_eq!(restarted.account_id(), "alice.near");
}

#[tokio::test]
async fn test_corrupt_stored_session_reads_as_signed_out() {
    let store = Arc::new(MemoryStore::new());
    assert_ok!(store.set("demo_wallet_auth_key", "definitely not json"));

    let client = client("https://app.example/", store);
    assert!(!client.is_signed_in());
}
