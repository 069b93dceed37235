use crate::{CapabilityHandler, CapabilityRequest, DeviceId, Dispatch, EventDraft};
use serde_json::{json, Value};
use std::any::Any;

pub const SET_POWER_STATE: &str = "setPowerState";

pub type PowerStateCallback = Box<dyn FnMut(&DeviceId, &mut bool) -> bool>;

/// On/off capability. No instances; the broker sends `"state": "On"` or
/// `"Off"` and expects the actual resulting state back.
pub struct PowerStateController {
    callback: Option<PowerStateCallback>,
}

impl Default for PowerStateController {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerStateController {
    pub fn new() -> Self {
        Self { callback: None }
    }

    pub fn on_power_state(&mut self, cb: impl FnMut(&DeviceId, &mut bool) -> bool + 'static) {
        self.callback = Some(Box::new(cb));
    }

    pub fn state_event(&self, on: bool) -> EventDraft {
        EventDraft::new(SET_POWER_STATE, json!({ "state": state_str(on) }))
    }
}

fn state_str(on: bool) -> &'static str {
    if on {
        "On"
    } else {
        "Off"
    }
}

impl CapabilityHandler for PowerStateController {
    fn matches(&self, action: &str) -> bool {
        action == SET_POWER_STATE
    }

    fn invoke(&mut self, device_id: &DeviceId, request: &mut CapabilityRequest<'_>) -> Dispatch {
        let mut on = request.request_value["state"].as_str() == Some("On");
        let success = match self.callback.as_mut() {
            Some(cb) => cb(device_id, &mut on),
            None => false,
        };
        request.response_value["state"] = Value::from(state_str(on));
        Dispatch::Handled(success)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
