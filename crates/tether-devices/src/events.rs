use serde_json::Value;
use tether_protocol::PHYSICAL_INTERACTION;

/// An outbound state event drafted by a capability, before the engine
/// wraps it in a wire message, stamps and signs it.
#[derive(Clone, Debug)]
pub struct EventDraft {
    /// Canonical action name of the capability, e.g. "setRangeValue".
    pub action: String,
    pub instance: Option<String>,
    pub value: Value,
    pub cause: String,
}

impl EventDraft {
    pub fn new(action: impl Into<String>, value: Value) -> Self {
        Self {
            action: action.into(),
            instance: None,
            value,
            cause: PHYSICAL_INTERACTION.to_string(),
        }
    }

    #[must_use]
    pub fn for_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = cause.into();
        self
    }
}
