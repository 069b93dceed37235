use core::fmt;
use time::OffsetDateTime;

/// Network interface a message arrived on or must be sent over.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TransportKind {
    Websocket,
    Udp,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Websocket => write!(f, "websocket"),
            TransportKind::Udp => write!(f, "udp"),
        }
    }
}

/// A raw serialized message tagged with its interface.
///
/// Created by a transport (inbound) or by the engine (outbound), owned by
/// the queue until dequeued, then owned by the consumer.
#[derive(Clone, Debug)]
pub struct QueueEntry {
    pub kind: TransportKind,
    pub text: String,
    pub received_at: Option<OffsetDateTime>,
}

impl QueueEntry {
    pub fn new(kind: TransportKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            received_at: None,
        }
    }

    /// Entry stamped with the current wall-clock time (inbound side).
    pub fn stamped(kind: TransportKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            received_at: Some(OffsetDateTime::now_utc()),
        }
    }
}

/// Connection parameters handed to a transport on `begin`.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Broker address, e.g. "ws.tether.dev".
    pub server: String,
    /// Socket authentication token presented during the handshake.
    pub app_key: String,
    /// Semicolon-joined roster is built by the transport; the engine hands
    /// over only the valid device ids.
    pub device_ids: Vec<String>,
    /// Ask the broker to replay last known device states after connecting.
    pub restore_device_states: bool,
}
