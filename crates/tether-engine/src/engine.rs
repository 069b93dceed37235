use crate::{Config, ConnectionEvent, ConnectionState};
use tether_devices::{Device, DeviceId, DeviceProfile, DeviceRegistry, EventDraft};
use tether_protocol::{ClockSync, Message, MessageType};
use tether_transport::{
    MessageQueue, QueueEntry, SharedQueue, Transport, TransportConfig, TransportKind,
};

const GENERIC_FAILURE: &str = "Device returned an error while processing the request";

type StatusCallback = Box<dyn FnMut()>;

/// The communication engine. One value per broker relationship, owned by
/// the application's entry point; there is no implicit global instance.
pub struct Engine {
    config: Option<Config>,
    registry: DeviceRegistry,
    inbound: SharedQueue,
    outbound: MessageQueue,
    clock: ClockSync,
    state: ConnectionState,
    transports: Vec<Box<dyn Transport>>,
    restore_device_states: bool,
    response_message: Option<String>,
    on_connected: Option<StatusCallback>,
    on_disconnected: Option<StatusCallback>,
    disabled_logged: bool,
}

impl Engine {
    /// Build an engine over its transport collaborators. The transports
    /// are handed the inbound queue on connect and polled every tick.
    pub fn new(transports: Vec<Box<dyn Transport>>) -> Self {
        Self {
            config: None,
            registry: DeviceRegistry::new(),
            inbound: SharedQueue::new(),
            outbound: MessageQueue::new(),
            clock: ClockSync::new(),
            state: ConnectionState::Disconnected,
            transports,
            restore_device_states: false,
            response_message: None,
            on_connected: None,
            on_disconnected: None,
            disabled_logged: false,
        }
    }

    /// Store and validate credentials. Until this succeeds (and at least
    /// one valid device is registered) every tick is a logged no-op.
    pub fn configure(
        &mut self,
        app_key: &str,
        app_secret: &str,
        server: &str,
    ) -> crate::Result<()> {
        let config = Config::new(app_key, app_secret, server);
        config.validate()?;
        tracing::info!(server = %config.server, "engine configured");
        self.config = Some(config);
        self.disabled_logged = false;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    pub fn on_connected(&mut self, cb: impl FnMut() + 'static) {
        self.on_connected = Some(Box::new(cb));
    }

    pub fn on_disconnected(&mut self, cb: impl FnMut() + 'static) {
        self.on_disconnected = Some(Box::new(cb));
    }

    /// Observe websocket heartbeat round trips (latency in milliseconds).
    pub fn on_pong(&mut self, cb: impl FnMut(u64) + 'static) {
        if let Some(transport) = self
            .transports
            .iter_mut()
            .find(|t| t.kind() == TransportKind::Websocket)
        {
            transport.on_pong(Box::new(cb));
        }
    }

    /// Ask the broker to replay last known device states after connect.
    pub fn set_restore_device_states_on_connect(&mut self, flag: bool) {
        self.restore_device_states = flag;
    }

    /// One-shot error text for the next failed request, replacing the
    /// generic message.
    pub fn set_response_message(&mut self, message: impl Into<String>) {
        self.response_message = Some(message.into());
    }

    /// Get or lazily create a device. Creating one while connected forces
    /// a reconnect so the broker learns the updated roster.
    pub fn device<P: DeviceProfile>(&mut self, id: DeviceId) -> &mut Device {
        if !self.registry.contains(&id) {
            self.registry.get_or_create::<P>(id.clone());
            if self.state == ConnectionState::Connected {
                tracing::info!("device roster changed while connected; redialing broker");
                self.stop_transports();
                self.state = self.state.apply(ConnectionEvent::DeviceListChanged);
                self.connect();
            }
        }
        self.registry.get_or_create::<P>(id)
    }

    /// Queue a state event for transmission. Returns `false` and drops
    /// the draft when the connection is not established or the device
    /// id can never reach the broker.
    pub fn send_event(&mut self, device_id: &DeviceId, draft: EventDraft) -> bool {
        if self.state != ConnectionState::Connected {
            tracing::debug!(device_id = %device_id, action = %draft.action, "offline; event dropped");
            return false;
        }
        if !device_id.is_valid() {
            tracing::debug!(device_id = %device_id, "invalid device id; event dropped");
            return false;
        }
        let mut message = Message::event(
            device_id.as_str(),
            &draft.action,
            draft.instance.as_deref(),
            &draft.cause,
        );
        message.payload.value = draft.value;
        match message.to_json() {
            Ok(text) => {
                self.outbound.push(QueueEntry::new(TransportKind::Websocket, text));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "event serialization failed");
                false
            }
        }
    }

    /// One scheduling tick: reconnect if needed, poll transports, drain
    /// both queues to empty. Call this from the host's main loop.
    pub fn tick(&mut self) {
        if self.config.is_none() || !self.registry.has_valid_device() {
            if !self.disabled_logged {
                tracing::warn!(
                    "engine disabled: configure() missing/failed or no valid device registered"
                );
                self.disabled_logged = true;
            }
            return;
        }

        self.observe_connection();
        if self.state == ConnectionState::Disconnected {
            self.connect();
        }
        for transport in &mut self.transports {
            transport.poll();
        }
        self.observe_connection();

        self.drain_inbound();
        self.drain_outbound();
    }

    /// Disable the engine and close the link.
    pub fn stop(&mut self) {
        let was_connected = self.state == ConnectionState::Connected;
        self.stop_transports();
        self.state = self.state.apply(ConnectionEvent::Stopped);
        if was_connected {
            if let Some(cb) = self.on_disconnected.as_mut() {
                cb();
            }
        }
        tracing::info!("engine stopped");
    }

    fn connect(&mut self) {
        let Some(config) = &self.config else {
            return;
        };
        let device_ids = self.registry.valid_ids();
        if device_ids.is_empty() {
            return;
        }
        let transport_config = TransportConfig {
            server: config.server.clone(),
            app_key: config.app_key.as_str().to_string(),
            device_ids,
            restore_device_states: self.restore_device_states,
        };
        let inbound = self.inbound.clone();
        for transport in &mut self.transports {
            if let Err(e) = transport.begin(&transport_config, inbound.clone()) {
                tracing::warn!(kind = %transport.kind(), error = %e, "transport failed to start");
            }
        }
        self.state = self.state.apply(ConnectionEvent::ConnectRequested);
    }

    fn stop_transports(&mut self) {
        for transport in &mut self.transports {
            transport.stop();
        }
    }

    /// The engine observes the handshake rather than driving it: the
    /// websocket link's own state is the source of truth.
    fn observe_connection(&mut self) {
        let link_up = self
            .transports
            .iter()
            .find(|t| t.kind() == TransportKind::Websocket)
            .map(|t| t.is_connected())
            .unwrap_or(false);
        match (self.state, link_up) {
            (ConnectionState::Connecting, true) => {
                self.state = self.state.apply(ConnectionEvent::HandshakeComplete);
                tracing::info!("connected to broker");
                if let Some(cb) = self.on_connected.as_mut() {
                    cb();
                }
            }
            (ConnectionState::Connected, false) => {
                self.state = self.state.apply(ConnectionEvent::TransportLost);
                tracing::warn!("broker connection lost; will redial next tick");
                if let Some(cb) = self.on_disconnected.as_mut() {
                    cb();
                }
            }
            _ => {}
        }
    }

    fn drain_inbound(&mut self) {
        let entries = self.inbound.drain();
        if entries.is_empty() {
            return;
        }
        tracing::debug!(count = entries.len(), "draining inbound queue");
        let Some(secret) = self
            .config
            .as_ref()
            .map(|c| c.app_secret.as_str().to_string())
        else {
            return;
        };
        for entry in entries {
            if !tether_protocol::verify(&secret, &entry.text) {
                tracing::warn!(kind = %entry.kind, "signature mismatch; message discarded");
                continue;
            }
            if tether_protocol::is_timestamp_probe(&entry.text) {
                self.learn_probe(&entry.text);
                continue;
            }
            let message = match Message::parse(&entry.text) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(error = %e, "unparseable message discarded");
                    continue;
                }
            };
            self.clock.learn(message.payload.created_at);
            match message.payload.kind {
                MessageType::Response => Self::handle_response(&message),
                MessageType::Request => self.handle_request(&message, entry.kind),
                MessageType::Event => {
                    tracing::debug!(action = %message.payload.action, "ignoring broker event");
                }
            }
        }
    }

    fn learn_probe(&mut self, raw: &str) {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
            return;
        };
        if let Some(epoch) = value["timestamp"].as_u64() {
            self.clock.learn(epoch);
        }
    }

    /// No reply correlation is tracked beyond the reply token; responses
    /// are diagnostic only.
    fn handle_response(message: &Message) {
        tracing::debug!(
            action = %message.payload.action,
            reply_token = %message.payload.reply_token,
            success = ?message.payload.success,
            "broker acknowledged"
        );
    }

    fn handle_request(&mut self, request: &Message, kind: TransportKind) {
        let device_id = DeviceId::new(request.payload.device_id.as_str());
        let instance = request.payload.instance_id.as_deref().unwrap_or("");
        let mut response = Message::response_to(request);

        let Some(device) = self.registry.get_mut(&device_id) else {
            tracing::warn!(device_id = %device_id, "request for unknown device discarded");
            return;
        };
        let outcome = device.handle_request(
            &request.payload.action,
            instance,
            &request.payload.value,
            &mut response.payload.value,
        );
        if outcome.is_none() {
            tracing::debug!(action = %request.payload.action, "no capability claimed the action");
        }

        let success = outcome == Some(true);
        response.payload.success = Some(success);
        if !success {
            let text = self
                .response_message
                .take()
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            response.payload.message = Some(text);
        }

        match response.to_json() {
            Ok(text) => self.outbound.push(QueueEntry::new(kind, text)),
            Err(e) => tracing::warn!(error = %e, "response serialization failed"),
        }
    }

    fn drain_outbound(&mut self) {
        if self.state != ConnectionState::Connected {
            return;
        }
        if !self.clock.synchronized() {
            // Sending before the offset is learned would stamp createdAt
            // with garbage the broker rejects; hold the queue instead.
            return;
        }
        let Some(secret) = self
            .config
            .as_ref()
            .map(|c| c.app_secret.as_str().to_string())
        else {
            return;
        };
        while let Some(entry) = self.outbound.pop() {
            let mut message = match Message::parse(&entry.text) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(error = %e, "unserializable outbound entry dropped");
                    continue;
                }
            };
            if let Some(now) = self.clock.now() {
                message.payload.created_at = now;
            }
            let text = match tether_protocol::sign(&secret, &message) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(error = %e, "signing failed; message dropped");
                    continue;
                }
            };
            match self
                .transports
                .iter_mut()
                .find(|t| t.kind() == entry.kind)
            {
                Some(transport) => {
                    if let Err(e) = transport.send(&text) {
                        tracing::warn!(kind = %entry.kind, error = %e, "send failed");
                    }
                }
                None => tracing::warn!(kind = %entry.kind, "no transport for interface"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_devices::Switch;
    use tether_transport::{MockProbe, MockTransport};

    const APP_KEY: &str = "de0b8a11-1a3b-4c3d-aa2e-5dab00000000";
    const APP_SECRET: &str =
        "5f360000-a3b7-4c3d-aebe-e86724a90000-4c4a0000-3b3c-45de-a9a3-333d65000000";
    const DEVICE: &str = "5dc1564130b2a3f9c8d7e6f0";

    fn engine_with_mocks() -> (Engine, MockProbe, MockProbe) {
        let ws = MockTransport::new(TransportKind::Websocket);
        let udp = MockTransport::new(TransportKind::Udp);
        let (ws_probe, udp_probe) = (ws.probe(), udp.probe());
        let engine = Engine::new(vec![Box::new(ws), Box::new(udp)]);
        (engine, ws_probe, udp_probe)
    }

    fn configured_engine() -> (Engine, MockProbe, MockProbe) {
        let (mut engine, ws, udp) = engine_with_mocks();
        assert!(engine
            .configure(APP_KEY, APP_SECRET, crate::DEFAULT_SERVER)
            .is_ok());
        engine.device::<Switch>(DeviceId::new(DEVICE));
        (engine, ws, udp)
    }

    #[test]
    fn configure_rejects_bad_credentials() {
        let (mut engine, _, _) = engine_with_mocks();
        assert!(engine
            .configure("bad", APP_SECRET, crate::DEFAULT_SERVER)
            .is_err());
        assert!(engine
            .configure(APP_KEY, "bad", crate::DEFAULT_SERVER)
            .is_err());
        assert!(engine
            .configure(APP_KEY, APP_SECRET, crate::DEFAULT_SERVER)
            .is_ok());
    }

    #[test]
    fn unconfigured_engine_ticks_are_noops() {
        let (mut engine, ws, _) = engine_with_mocks();
        engine.tick();
        engine.tick();
        assert!(!engine.is_connected());
        assert_eq!(ws.begin_count(), 0);
    }

    #[test]
    fn engine_with_only_invalid_devices_stays_disabled() {
        let (mut engine, ws, _) = engine_with_mocks();
        assert!(engine
            .configure(APP_KEY, APP_SECRET, crate::DEFAULT_SERVER)
            .is_ok());
        engine.device::<Switch>(DeviceId::new("not-hex"));
        engine.tick();
        assert_eq!(ws.begin_count(), 0);
    }

    #[test]
    fn tick_connects_and_fires_callback() {
        let (mut engine, ws, _) = configured_engine();
        let connected = std::rc::Rc::new(std::cell::Cell::new(false));
        let seen = std::rc::Rc::clone(&connected);
        engine.on_connected(move || seen.set(true));

        engine.tick();
        assert!(engine.is_connected());
        assert!(connected.get());
        let roster = ws.last_config().map(|c| c.device_ids);
        assert_eq!(roster, Some(vec![DEVICE.to_string()]));
    }

    #[test]
    fn connection_loss_triggers_redial_next_tick() {
        let (mut engine, ws, _) = configured_engine();
        let drops = std::rc::Rc::new(std::cell::Cell::new(0));
        let seen = std::rc::Rc::clone(&drops);
        engine.on_disconnected(move || seen.set(seen.get() + 1));

        engine.tick();
        assert!(engine.is_connected());
        ws.drop_connection();
        engine.tick(); // observes the loss
        assert_eq!(drops.get(), 1);
        engine.tick(); // redials
        assert!(engine.is_connected());
        assert_eq!(ws.begin_count(), 2);
    }

    #[test]
    fn adding_device_while_connected_redials_with_new_roster() {
        let (mut engine, ws, _) = configured_engine();
        engine.tick();
        assert_eq!(ws.begin_count(), 1);

        engine.device::<Switch>(DeviceId::new("aabbccddeeff001122334455"));
        assert_eq!(ws.begin_count(), 2);
        let roster = ws.last_config().map(|c| c.device_ids).unwrap_or_default();
        assert_eq!(roster.len(), 2);

        // Re-referencing an existing device must not redial.
        engine.device::<Switch>(DeviceId::new(DEVICE));
        assert_eq!(ws.begin_count(), 2);
    }

    #[test]
    fn pong_observer_sees_heartbeat_latency() {
        let (mut engine, ws, _) = configured_engine();
        let latency = std::rc::Rc::new(std::cell::Cell::new(0u64));
        let seen = std::rc::Rc::clone(&latency);
        engine.on_pong(move |ms| seen.set(ms));

        engine.tick();
        ws.pong(37);
        engine.tick();
        assert_eq!(latency.get(), 37);
    }

    #[test]
    fn events_are_dropped_while_offline() {
        let (mut engine, _, _) = configured_engine();
        let draft = EventDraft::new("setPowerState", serde_json::json!({"state": "On"}));
        assert!(!engine.send_event(&DeviceId::new(DEVICE), draft));
    }

    #[test]
    fn outbound_is_held_until_clock_is_synchronized() {
        let (mut engine, ws, _) = configured_engine();
        engine.tick();
        let draft = EventDraft::new("setPowerState", serde_json::json!({"state": "On"}));
        assert!(engine.send_event(&DeviceId::new(DEVICE), draft));
        engine.tick();
        assert!(ws.sent().is_empty());

        ws.inject("{\"timestamp\":1700000000}");
        engine.tick();
        let sent = ws.sent();
        assert_eq!(sent.len(), 1);
        assert!(tether_protocol::verify(APP_SECRET, &sent[0]));
        let message = match Message::parse(&sent[0]) {
            Ok(m) => m,
            Err(e) => panic!("sent message unparseable: {e}"),
        };
        assert!(message.payload.created_at >= 1_700_000_000);
    }

    #[test]
    fn set_response_message_applies_once() {
        let (mut engine, ws, _) = configured_engine();
        engine.tick();
        ws.inject("{\"timestamp\":1700000000}");

        let request = {
            let mut m = Message::event(DEVICE, "setPowerState", None, "x");
            m.payload.kind = MessageType::Request;
            m.payload.cause = None;
            m.payload.value = serde_json::json!({"state": "On"});
            m.payload.created_at = 1_700_000_000;
            match tether_protocol::sign(APP_SECRET, &m) {
                Ok(t) => t,
                Err(e) => panic!("sign failed: {e}"),
            }
        };
        engine.set_response_message("relay jammed");
        ws.inject(request.clone());
        ws.inject(request);
        engine.tick();

        let sent = ws.sent();
        assert_eq!(sent.len(), 2);
        let first = match Message::parse(&sent[0]) {
            Ok(m) => m,
            Err(e) => panic!("parse failed: {e}"),
        };
        let second = match Message::parse(&sent[1]) {
            Ok(m) => m,
            Err(e) => panic!("parse failed: {e}"),
        };
        // No callback bound: both fail, only the first carries the override.
        assert_eq!(first.payload.success, Some(false));
        assert_eq!(first.payload.message.as_deref(), Some("relay jammed"));
        assert_eq!(
            second.payload.message.as_deref(),
            Some(GENERIC_FAILURE)
        );
    }
}
