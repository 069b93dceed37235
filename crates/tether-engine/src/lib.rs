//! tether-engine: the top-level broker-communication orchestrator
//!
//! One `Engine` value serves one device-to-broker relationship. The host
//! calls `tick()` from its main loop; each tick polls the transports,
//! drains the inbound queue (verify, classify, dispatch to devices), and
//! drains the outbound queue (stamp, sign, transmit). The engine spawns no
//! threads of its own.

mod config;
pub use config::{AppKey, AppSecret, Config, DEFAULT_SERVER};

mod connection;
pub use connection::{ConnectionEvent, ConnectionState};

mod engine;
pub use engine::Engine;

mod error;
pub use error::{EngineError, Result};
