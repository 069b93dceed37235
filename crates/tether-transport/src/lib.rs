//! tether-transport: transport abstractions for the Tether broker client
//!
//! This crate provides the traits and types the engine uses to talk to its
//! network collaborators (websocket and UDP listeners), with feature-gated
//! backends. The default build enables a `mock` backend so that binaries
//! and tests can compile on any host without a live broker.

mod types;
pub use types::{QueueEntry, TransportConfig, TransportKind};

mod queue;
pub use queue::{MessageQueue, SharedQueue};

mod error;
pub use error::{Result, TransportError};

mod traits;
pub use traits::{PongCallback, Transport};

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::{MockProbe, MockTransport};
