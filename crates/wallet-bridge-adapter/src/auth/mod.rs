/*
[INPUT]:  Wallet configuration, page URL and a durable key-value store
[OUTPUT]: Signed-in session state, sign-in redirect URLs and persisted AuthData
[POS]:    Auth layer - session state machine gating remote signing
[UPDATE]: When sign-in flow or session persistence changes
*/

pub mod flow;
pub mod session;
pub mod store;

pub use flow::AuthFlow;
pub use session::Session;
pub use store::{FileStore, KeyValueStore, MemoryStore, SessionStore};
