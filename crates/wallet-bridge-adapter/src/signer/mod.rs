/*
[INPUT]:  Transactions to sign and wallet responses
[OUTPUT]: Correlated, single-shot signing results
[POS]:    Signer layer - remote signing over the wallet channel
[UPDATE]: When adding wallet actions or changing correlation semantics
*/

pub mod correlator;
pub mod remote;

pub use correlator::RequestCorrelator;
pub use remote::RemoteSigner;
