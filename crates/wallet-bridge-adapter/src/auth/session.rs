/*
[INPUT]:  AuthData committed by the sign-in flow
[OUTPUT]: Shared view of the active session (signed-in state, account, token)
[POS]:    Auth layer - in-memory session owned by the client
[UPDATE]: When adding session metadata or changing sharing strategy
*/

use std::sync::{Arc, PoisonError, RwLock};

use crate::types::AuthData;

/// Thread-safe handle to the single active session
///
/// Clones share the same state; the client hands one to the auth flow and
/// one to the remote signer.
#[derive(Debug, Clone, Default)]
pub struct Session {
    data: Arc<RwLock<Option<AuthData>>>,
}

impl Session {
    /// Create a signed-out session
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active session record
    pub fn set(&self, auth_data: AuthData) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(auth_data);
    }

    /// Active record, if any
    pub fn auth_data(&self) -> Option<AuthData> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// Signed-in account id
    pub fn account_id(&self) -> Option<String> {
        self.auth_data()
            .filter(AuthData::is_active)
            .map(|data| data.account_id)
    }

    pub fn is_signed_in(&self) -> bool {
        self.account_id().is_some()
    }

    /// Drop the active record
    pub fn clear(&self) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}
