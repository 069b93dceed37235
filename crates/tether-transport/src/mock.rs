use crate::{
    PongCallback, QueueEntry, Result, SharedQueue, Transport, TransportConfig, TransportKind,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct MockState {
    connected: bool,
    scripted: VecDeque<String>,
    pongs: VecDeque<u64>,
    sent: Vec<String>,
    last_config: Option<TransportConfig>,
    begin_count: usize,
}

/// In-process mock transport. `begin` connects immediately; `poll` delivers
/// any scripted messages to the inbound queue in order.
pub struct MockTransport {
    kind: TransportKind,
    inbound: Option<SharedQueue>,
    pong: Option<PongCallback>,
    state: Arc<Mutex<MockState>>,
}

/// Shared handle onto a mock transport's internals, kept by tests after
/// the transport itself has been boxed and handed to the engine.
#[derive(Clone)]
pub struct MockProbe {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new(kind: TransportKind) -> Self {
        Self {
            kind,
            inbound: None,
            pong: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    pub fn probe(&self) -> MockProbe {
        MockProbe {
            state: Arc::clone(&self.state),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MockProbe {
    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a message for delivery on the next `poll`.
    pub fn inject(&self, text: impl Into<String>) {
        self.lock().scripted.push_back(text.into());
    }

    /// Script a heartbeat round trip with the given latency, delivered to
    /// the pong observer on the next `poll`.
    pub fn pong(&self, latency_ms: u64) {
        self.lock().pongs.push_back(latency_ms);
    }

    /// Everything the engine asked this transport to send, oldest first.
    pub fn sent(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    /// Drop the link, simulating a broker-side disconnect.
    pub fn drop_connection(&self) {
        self.lock().connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    pub fn begin_count(&self) -> usize {
        self.lock().begin_count
    }

    pub fn last_config(&self) -> Option<TransportConfig> {
        self.lock().last_config.clone()
    }
}

impl Transport for MockTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn begin(&mut self, config: &TransportConfig, inbound: SharedQueue) -> Result<()> {
        self.inbound = Some(inbound);
        let mut state = self.lock();
        state.connected = true;
        state.begin_count += 1;
        state.last_config = Some(config.clone());
        tracing::debug!(kind = %self.kind, server = %config.server, "mock transport connected");
        Ok(())
    }

    fn poll(&mut self) {
        let Some(inbound) = self.inbound.clone() else {
            return;
        };
        let (texts, pongs): (Vec<String>, Vec<u64>) = {
            let mut state = self.lock();
            if !state.connected {
                return;
            }
            (
                state.scripted.drain(..).collect(),
                state.pongs.drain(..).collect(),
            )
        };
        for text in texts {
            inbound.push(QueueEntry::stamped(self.kind, text));
        }
        if let Some(cb) = self.pong.as_mut() {
            for latency_ms in pongs {
                cb(latency_ms);
            }
        }
    }

    fn send(&mut self, text: &str) -> Result<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(crate::TransportError::NotConnected);
        }
        state.sent.push(text.to_string());
        Ok(())
    }

    fn stop(&mut self) {
        self.lock().connected = false;
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    fn on_pong(&mut self, cb: PongCallback) {
        self.pong = Some(cb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TransportConfig {
        TransportConfig {
            server: "ws.tether.dev".to_string(),
            app_key: "key".to_string(),
            device_ids: vec!["aabbccddeeff001122334455".to_string()],
            restore_device_states: false,
        }
    }

    #[test]
    fn begin_connects_and_records_config() {
        let mut transport = MockTransport::new(TransportKind::Websocket);
        let probe = transport.probe();
        assert!(transport.begin(&config(), SharedQueue::new()).is_ok());
        assert!(transport.is_connected());
        assert_eq!(probe.begin_count(), 1);
        let cfg = probe.last_config();
        assert_eq!(cfg.map(|c| c.server).as_deref(), Some("ws.tether.dev"));
    }

    #[test]
    fn poll_delivers_scripted_messages_in_order() {
        let mut transport = MockTransport::new(TransportKind::Udp);
        let probe = transport.probe();
        let inbound = SharedQueue::new();
        assert!(transport.begin(&config(), inbound.clone()).is_ok());
        probe.inject("first");
        probe.inject("second");
        transport.poll();
        let texts: Vec<String> = inbound.drain().into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn send_fails_when_disconnected() {
        let mut transport = MockTransport::new(TransportKind::Websocket);
        assert!(matches!(
            transport.send("{}"),
            Err(crate::TransportError::NotConnected)
        ));
        let probe = transport.probe();
        assert!(transport.begin(&config(), SharedQueue::new()).is_ok());
        assert!(transport.send("{}").is_ok());
        assert_eq!(probe.sent(), vec!["{}".to_string()]);
    }

    #[test]
    fn scripted_pongs_reach_the_observer() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut transport = MockTransport::new(TransportKind::Websocket);
        let probe = transport.probe();
        let latencies = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&latencies);
        transport.on_pong(Box::new(move |ms| seen.borrow_mut().push(ms)));

        probe.pong(42);
        transport.poll();
        // Not connected yet: nothing delivered.
        assert!(latencies.borrow().is_empty());

        assert!(transport.begin(&config(), SharedQueue::new()).is_ok());
        transport.poll();
        assert_eq!(*latencies.borrow(), vec![42]);
    }

    #[test]
    fn stop_disconnects() {
        let mut transport = MockTransport::new(TransportKind::Websocket);
        assert!(transport.begin(&config(), SharedQueue::new()).is_ok());
        transport.stop();
        assert!(!transport.is_connected());
    }
}
