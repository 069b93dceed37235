use crate::{Result, SharedQueue, TransportConfig, TransportKind};

/// Observer for heartbeat round trips; the argument is the measured
/// latency in milliseconds.
pub type PongCallback = Box<dyn FnMut(u64)>;

/// A minimal polled transport interface.
///
/// Implementations append received messages to the inbound queue handed to
/// `begin`; the engine never calls back into a transport from within a
/// drain. All methods must be non-blocking or bounded.
pub trait Transport {
    /// Which interface this transport serves.
    fn kind(&self) -> TransportKind;

    /// Open the connection and remember where to deliver inbound messages.
    fn begin(&mut self, config: &TransportConfig, inbound: SharedQueue) -> Result<()>;

    /// Non-blocking liveness/IO poll.
    fn poll(&mut self);

    /// Send one already-serialized message.
    fn send(&mut self, text: &str) -> Result<()>;

    /// Close the connection.
    fn stop(&mut self);

    fn is_connected(&self) -> bool;

    /// Register a heartbeat observer. Backends without a ping/pong cycle
    /// (UDP) ignore the registration.
    fn on_pong(&mut self, _cb: PongCallback) {}
}
