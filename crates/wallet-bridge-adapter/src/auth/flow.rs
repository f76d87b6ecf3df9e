/*
[INPUT]:  Wallet config, current page URL, resuming URL query parameters
[OUTPUT]: Sign-in redirect URL and committed AuthData
[POS]:    Auth layer - orchestrates the redirect-based sign-in flow
[UPDATE]: When wallet login parameters or return parameters change
*/

use tracing::{debug, info};
use url::Url;

use crate::config::WalletConfig;
use crate::error::Result;
use crate::types::AuthData;

use super::{Session, SessionStore};

const AUTH_TOKEN_PARAM: &str = "auth_token";
const ACCOUNT_ID_PARAM: &str = "account_id";

/// Drives `SignedOut -> AwaitingReturn -> SignedIn -> SignedOut`
///
/// `AwaitingReturn` is never stored: it is the time spent on the wallet's
/// login page between [`AuthFlow::build_sign_in_url`] and
/// [`AuthFlow::complete_sign_in_from_return_url`].
#[derive(Debug, Clone)]
pub struct AuthFlow {
    login_url: Url,
    page_url: Url,
    auth_key: String,
    session: Session,
    store: SessionStore,
}

impl AuthFlow {
    pub fn new(
        config: &WalletConfig,
        page_url: Url,
        session: Session,
        store: SessionStore,
    ) -> Result<Self> {
        Ok(Self {
            login_url: config.login_url()?,
            page_url,
            auth_key: config.auth_key(),
            session,
            store,
        })
    }

    /// Shared session this flow commits into
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Load a previously persisted session into memory
    pub fn restore(&self) -> Option<AuthData> {
        let auth_data = self.store.load(&self.auth_key)?;
        debug!(account_id = %auth_data.account_id, "restored persisted session");
        self.session.set(auth_data.clone());
        Some(auth_data)
    }

    /// Wallet login URL; the caller performs the navigation
    ///
    /// Success and failure URLs default to the current page.
    pub fn build_sign_in_url(
        &self,
        contract_id: &str,
        title: &str,
        success_url: Option<&str>,
        failure_url: Option<&str>,
    ) -> Url {
        let current = self.page_url.as_str();
        let mut url = self.login_url.clone();
        url.query_pairs_mut()
            .append_pair("title", title)
            .append_pair("contract_id", contract_id)
            .append_pair("success_url", success_url.unwrap_or(current))
            .append_pair("failure_url", failure_url.unwrap_or(current))
            .append_pair("app_url", &self.page_url.origin().ascii_serialization());
        url
    }

    /// Commit the credentials carried by a resuming URL
    ///
    /// Returns `Ok(None)` and leaves state untouched unless both `auth_token`
    /// and `account_id` are present and non-empty. A repeated parameter
    /// counts by its first occurrence.
    pub fn complete_sign_in_from_return_url(&self, url: &Url) -> Result<Option<AuthData>> {
        let mut auth_token = None;
        let mut account_id = None;
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                AUTH_TOKEN_PARAM if auth_token.is_none() => auth_token = Some(value.into_owned()),
                ACCOUNT_ID_PARAM if account_id.is_none() => account_id = Some(value.into_owned()),
                _ => {}
            }
        }

        let (Some(auth_token), Some(account_id)) = (auth_token, account_id) else {
            debug!("return url carries no wallet credentials");
            return Ok(None);
        };
        if auth_token.is_empty() || account_id.is_empty() {
            debug!("return url carries empty wallet credentials");
            return Ok(None);
        }

        let auth_data = AuthData::new(account_id, auth_token);
        self.store.save(&self.auth_key, &auth_data)?;
        self.session.set(auth_data.clone());

        info!(account_id = %auth_data.account_id, "signed in");
        Ok(Some(auth_data))
    }

    /// Forget the session in memory and in the store
    pub fn sign_out(&self) -> Result<()> {
        self.session.clear();
        self.store.clear(&self.auth_key)?;
        info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Arc;

    use rstest::rstest;

    use crate::auth::{KeyValueStore, MemoryStore};

    fn flow_with(store: MemoryStore) -> AuthFlow {
        let config = WalletConfig::new("https://wallet.example", "demo");
        let page_url = Url::parse("https://app.example/page?x=1").unwrap();
        AuthFlow::new(
            &config,
            page_url,
            Session::new(),
            SessionStore::new(Arc::new(store)),
        )
        .unwrap()
    }

    fn query(url: &Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn test_sign_in_url_defaults_to_current_page() {
        let flow = flow_with(MemoryStore::new());
        let url = flow.build_sign_in_url("contract.near", "My App", None, None);

        assert_eq!(url.origin().ascii_serialization(), "https://wallet.example");
        assert_eq!(url.path(), "/login/");

        let params = query(&url);
        assert_eq!(params["title"], "My App");
        assert_eq!(params["contract_id"], "contract.near");
        assert_eq!(params["success_url"], "https://app.example/page?x=1");
        assert_eq!(params["failure_url"], "https://app.example/page?x=1");
        assert_eq!(params["app_url"], "https://app.example");
    }

    #[test]
    fn test_sign_in_url_explicit_targets() {
        let flow = flow_with(MemoryStore::new());
        let url = flow.build_sign_in_url(
            "contract.near",
            "My App",
            Some("https://app.example/ok"),
            Some("https://app.example/fail"),
        );

        let params = query(&url);
        assert_eq!(params["success_url"], "https://app.example/ok");
        assert_eq!(params["failure_url"], "https://app.example/fail");
        let keys: Vec<_> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(
            keys,
            ["title", "contract_id", "success_url", "failure_url", "app_url"]
        );
    }

    #[test]
    fn test_complete_sign_in_commits_and_persists() {
        let store = MemoryStore::new();
        let flow = flow_with(store.clone());
        let url = Url::parse("https://app.example/cb?auth_token=T1&account_id=alice.near").unwrap();

        let data = flow.complete_sign_in_from_return_url(&url).unwrap().unwrap();
        assert_eq!(data, AuthData::new("alice.near", "T1"));
        assert_eq!(flow.session().account_id(), Some("alice.near".to_string()));
        assert!(store.get("demo_wallet_auth_key").is_some());
    }

    #[rstest]
    #[case("https://app.example/cb")]
    #[case("https://app.example/cb?auth_token=T1")]
    #[case("https://app.example/cb?account_id=alice.near")]
    #[case("https://app.example/cb?auth_token=&account_id=alice.near")]
    #[case("https://app.example/cb?auth_token=T1&account_id=")]
    fn test_incomplete_return_url_leaves_state(#[case] raw: &str) {
        let store = MemoryStore::new();
        let flow = flow_with(store.clone());
        let url = Url::parse(raw).unwrap();

        assert!(flow.complete_sign_in_from_return_url(&url).unwrap().is_none());
        assert!(!flow.session().is_signed_in());
        assert!(store.get("demo_wallet_auth_key").is_none());
    }

    #[test]
    fn test_repeated_parameters_use_first_value() {
        let flow = flow_with(MemoryStore::new());
        let url = Url::parse(
            "https://app.example/cb?auth_token=T1&account_id=alice.near&auth_token=&account_id=bob.near",
        )
        .unwrap();

        let data = flow.complete_sign_in_from_return_url(&url).unwrap().unwrap();
        assert_eq!(data, AuthData::new("alice.near", "T1"));
    }

    #[test]
    fn test_sign_out_clears_memory_and_store() {
        let store = MemoryStore::new();
        let flow = flow_with(store.clone());
        let url = Url::parse("https://app.example/cb?auth_token=T1&account_id=alice.near").unwrap();
        flow.complete_sign_in_from_return_url(&url).unwrap();

        flow.sign_out().unwrap();
        assert!(!flow.session().is_signed_in());
        assert!(store.get("demo_wallet_auth_key").is_none());

        flow.sign_out().unwrap();
    }

    #[test]
    fn test_restore_reads_persisted_session() {
        let store = MemoryStore::new();
        store
            .set(
                "demo_wallet_auth_key",
                r#"{"accountId":"alice.near","authToken":"T1"}"#,
            )
            .unwrap();
        let flow = flow_with(store);

        assert_eq!(flow.restore(), Some(AuthData::new("alice.near", "T1")));
        assert!(flow.session().is_signed_in());
    }
}
