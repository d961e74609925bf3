//! Wire-level protocol types
//!
//! Message payloads exchanged between token instances, the relayer
//! instructions attached to them, and the wrap fee computation.

mod adapter_params;
mod fee;
mod message;

pub use adapter_params::AdapterParams;
pub use fee::FeeQuote;
pub use message::{
    decode_recipient, encode_recipient, InboundMessage, MessageNonce, OutboundMessage, Payload,
    PayloadKind,
};
