use crate::DeviceId;
use serde_json::Value;
use std::any::Any;

/// What a capability handler did with a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dispatch {
    /// Not this handler's action (or an instance it has no binding for);
    /// the next registered handler gets a try.
    Unclaimed,
    /// Handler ran a callback; the flag is the callback's success result.
    Handled(bool),
}

/// One inbound request as seen by a capability handler.
pub struct CapabilityRequest<'a> {
    pub action: &'a str,
    /// Empty string = the default instance.
    pub instance: &'a str,
    pub request_value: &'a Value,
    /// Response `value` object; handlers write the resulting state here.
    pub response_value: &'a mut Value,
}

/// A registered capability: a predicate over action names plus the
/// callback-invocation logic for the actions it owns.
pub trait CapabilityHandler {
    fn matches(&self, action: &str) -> bool;

    fn invoke(&mut self, device_id: &DeviceId, request: &mut CapabilityRequest<'_>) -> Dispatch;

    /// Downcast hook so callers can reach a concrete capability for
    /// callback registration after the device has been composed.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// An addressable endpoint composed of capabilities.
///
/// Created lazily by the registry, lives for the process lifetime, never
/// removed. Handlers are tried in registration order.
pub struct Device {
    id: DeviceId,
    kind: &'static str,
    handlers: Vec<Box<dyn CapabilityHandler>>,
}

impl Device {
    pub fn new(id: DeviceId, kind: &'static str) -> Self {
        Self {
            id,
            kind,
            handlers: Vec::new(),
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Type label reported to the broker, e.g. "LIGHT".
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn register(&mut self, handler: Box<dyn CapabilityHandler>) {
        self.handlers.push(handler);
    }

    /// First registered capability of the requested concrete type.
    pub fn capability_mut<C: CapabilityHandler + 'static>(&mut self) -> Option<&mut C> {
        self.handlers
            .iter_mut()
            .find_map(|h| h.as_any_mut().downcast_mut::<C>())
    }

    /// Walk the handler chain. `None` means no handler claimed the action.
    pub fn handle_request(
        &mut self,
        action: &str,
        instance: &str,
        request_value: &Value,
        response_value: &mut Value,
    ) -> Option<bool> {
        let id = &self.id;
        for handler in &mut self.handlers {
            if !handler.matches(action) {
                continue;
            }
            let mut request = CapabilityRequest {
                action,
                instance,
                request_value,
                response_value: &mut *response_value,
            };
            match handler.invoke(id, &mut request) {
                Dispatch::Handled(success) => return Some(success),
                Dispatch::Unclaimed => {}
            }
        }
        None
    }
}
