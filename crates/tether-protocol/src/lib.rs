//! tether-protocol: the broker's JSON control-message schema
//!
//! Message types and builders, HMAC signing/verification over the raw
//! payload bytes, and the monotonic-to-epoch clock synchronizer.

mod message;
pub use message::{
    reply_token, Cause, Header, Message, MessageType, Payload, Signature, PAYLOAD_VERSION,
    PHYSICAL_INTERACTION, SIGNATURE_VERSION,
};

mod signature;
pub use signature::{calculate_signature, extract_payload, is_timestamp_probe, sign, verify};

mod clock;
pub use clock::ClockSync;

mod error;
pub use error::{ProtocolError, Result};
