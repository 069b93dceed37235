/// Connection lifecycle of the single broker link.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Observed or requested transitions. The engine observes the handshake
/// (the transport drives it) and reacts to roster changes explicitly
/// rather than as a hidden side effect of registering a device.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionEvent {
    ConnectRequested,
    HandshakeComplete,
    TransportLost,
    Stopped,
    /// The set of devices presented to the broker changed; a connected
    /// engine must drop the link and redial so the broker sees the new
    /// roster.
    DeviceListChanged,
}

impl ConnectionState {
    #[must_use]
    pub fn apply(self, event: ConnectionEvent) -> ConnectionState {
        use ConnectionEvent::*;
        use ConnectionState::*;
        match (self, event) {
            (Disconnected, ConnectRequested) => Connecting,
            (Connecting, HandshakeComplete) => Connected,
            (_, TransportLost) | (_, Stopped) => Disconnected,
            (Connected, DeviceListChanged) => Disconnected,
            (state, _) => state,
        }
    }
}
