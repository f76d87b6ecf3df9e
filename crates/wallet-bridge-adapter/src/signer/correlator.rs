/*
[INPUT]:  Outbound request ids and decoded inbound responses
[OUTPUT]: One-shot completion of the matching pending request
[POS]:    Signer layer - request/response correlation table
[UPDATE]: When changing id generation or completion semantics
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::Rng;
use rand::distributions::Alphanumeric;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::types::{InboundResponse, SignOutcome};

const REQUEST_ID_LEN: usize = 32;

/// Table of requests awaiting a wallet response
///
/// Each entry completes at most once: it is removed from the table before
/// its completion handle fires. Once closed, nothing new is tracked.
#[derive(Debug, Default)]
pub struct RequestCorrelator {
    pending: Mutex<HashMap<String, oneshot::Sender<SignOutcome>>>,
    closed: AtomicBool,
}

impl RequestCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh 32-character alphanumeric id; not cryptographically hardened
    pub fn next_request_id(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(REQUEST_ID_LEN)
            .map(char::from)
            .collect()
    }

    /// Track `request_id` and return the handle its response completes
    ///
    /// A colliding id replaces the older entry; that caller observes a
    /// closed channel. After [`RequestCorrelator::close`] the handle is
    /// returned already closed.
    pub fn register(&self, request_id: &str) -> oneshot::Receiver<SignOutcome> {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.lock();
        if self.closed.load(Ordering::Acquire) {
            debug!(request_id, "correlator closed; request not tracked");
            return rx;
        }
        if pending.insert(request_id.to_string(), tx).is_some() {
            warn!(request_id, "request id collision; replaced pending request");
        }
        rx
    }

    /// Complete the request a response belongs to
    ///
    /// Returns `false` (and changes nothing) when no request is pending under
    /// the response's id.
    pub fn resolve_incoming(&self, response: InboundResponse) -> bool {
        let (request_id, outcome) = response.into_outcome();
        let Some(sender) = self.lock().remove(&request_id) else {
            debug!(request_id = %request_id, "response for unknown request discarded");
            return false;
        };

        if sender.send(outcome).is_err() {
            debug!(request_id = %request_id, "caller stopped waiting before response arrived");
        }
        true
    }

    /// Drop a pending request without completing it
    pub fn cancel(&self, request_id: &str) -> bool {
        self.lock().remove(request_id).is_some()
    }

    /// Drop every pending request; callers observe a closed channel
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();
        drained.len()
    }

    /// Stop tracking new requests and fail every pending one
    pub fn close(&self) -> usize {
        let drained: Vec<_> = {
            let mut pending = self.lock();
            self.closed.store(true, Ordering::Release);
            pending.drain().collect()
        };
        drained.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn is_pending(&self, request_id: &str) -> bool {
        self.lock().contains_key(request_id)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, oneshot::Sender<SignOutcome>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
