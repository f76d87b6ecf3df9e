/*
[INPUT]:  Wallet protocol definitions and serde requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - type definitions shared by session, channel and signer
[UPDATE]: When the wire protocol changes or new types added
*/

pub mod messages;
pub mod session;
pub mod transaction;

pub use messages::*;
pub use session::*;
pub use transaction::*;
