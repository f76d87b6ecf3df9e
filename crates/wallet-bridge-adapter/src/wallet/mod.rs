/*
[INPUT]:  Wallet-side requests from the frame channel
[OUTPUT]: Signed responses from a local key
[POS]:    Wallet side - loopback implementation of the remote wallet
[UPDATE]: When the loopback wallet gains behavior
*/

pub mod keys;
pub mod local;

pub use keys::WalletKey;
pub use local::LocalWallet;
