/*
[INPUT]:  Account id and auth token issued by the wallet
[OUTPUT]: AuthData session record with JSON persistence format
[POS]:    Data layer - the single active session record
[UPDATE]: When the persisted session format changes
*/

use serde::{Deserialize, Serialize};

/// The persisted session: which account is signed in and the token the wallet issued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub account_id: String,
    pub auth_token: String,
}

impl AuthData {
    pub fn new(account_id: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            auth_token: auth_token.into(),
        }
    }

    /// A record only counts as a session when the account id is non-empty
    pub fn is_active(&self) -> bool {
        !self.account_id.is_empty()
    }
}
