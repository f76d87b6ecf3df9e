/*
[INPUT]:  Wallet embed endpoint and JSON payloads
[OUTPUT]: Origin-checked message exchange with the wallet frame
[POS]:    Channel layer - isolated communication with the wallet
[UPDATE]: When adding transports or changing the trust filter
*/

pub mod dispatch;
pub mod frame;
pub mod websocket;

pub use dispatch::{Disposition, MessageChannel};
pub use frame::{FrameResponder, FrameTransport, InboundMessage, MemoryFrame};
pub use websocket::WebSocketFrame;
