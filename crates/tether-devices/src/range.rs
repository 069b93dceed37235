//! Generalized settable/adjustable numeric capability.
//!
//! Every numeric capability the broker knows (range values, brightness,
//! and friends) follows the same contract: a "set" action carrying an
//! absolute value, an "adjust" action carrying a delta, a default-instance
//! callback, and per-instance callbacks tagged int or float. The mechanism
//! is implemented once here and parameterized by action names and value
//! field names.

use crate::{CapabilityHandler, CapabilityRequest, DeviceId, Dispatch, EventDraft};
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;

/// Action and value-field names for one range-like capability.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RangeActions {
    pub set: &'static str,
    pub adjust: &'static str,
    pub value_field: &'static str,
    pub delta_field: &'static str,
}

/// The canonical range capability.
pub const RANGE_VALUE: RangeActions = RangeActions {
    set: "setRangeValue",
    adjust: "adjustRangeValue",
    value_field: "rangeValue",
    delta_field: "rangeValueDelta",
};

/// Brightness: same mechanism, different vocabulary.
pub const BRIGHTNESS: RangeActions = RangeActions {
    set: "setBrightness",
    adjust: "adjustBrightness",
    value_field: "brightness",
    delta_field: "brightnessDelta",
};

pub type DefaultRangeCallback = Box<dyn FnMut(&DeviceId, &mut i64) -> bool>;
pub type InstanceIntCallback = Box<dyn FnMut(&DeviceId, &str, &mut i64) -> bool>;
pub type InstanceFloatCallback = Box<dyn FnMut(&DeviceId, &str, &mut f64) -> bool>;

/// Per-instance binding. The tag picks the callback shape at dispatch
/// time, so a float-bound instance never runs through the int path.
pub enum InstanceCallback {
    Int(InstanceIntCallback),
    Float(InstanceFloatCallback),
}

/// Value for an outbound range event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RangeValue {
    Int(i64),
    Float(f64),
}

impl From<i64> for RangeValue {
    fn from(v: i64) -> Self {
        RangeValue::Int(v)
    }
}

impl From<i32> for RangeValue {
    fn from(v: i32) -> Self {
        RangeValue::Int(i64::from(v))
    }
}

impl From<f64> for RangeValue {
    fn from(v: f64) -> Self {
        RangeValue::Float(v)
    }
}

impl From<RangeValue> for Value {
    fn from(v: RangeValue) -> Self {
        match v {
            RangeValue::Int(i) => Value::from(i),
            RangeValue::Float(f) => Value::from(f),
        }
    }
}

/// Handler for one range-like capability on one device.
///
/// At most one binding exists per (direction, instance); rebinding an
/// instance replaces the previous callback.
pub struct RangeController {
    actions: RangeActions,
    set_default: Option<DefaultRangeCallback>,
    adjust_default: Option<DefaultRangeCallback>,
    set_instances: HashMap<String, InstanceCallback>,
    adjust_instances: HashMap<String, InstanceCallback>,
}

impl RangeController {
    pub fn new(actions: RangeActions) -> Self {
        Self {
            actions,
            set_default: None,
            adjust_default: None,
            set_instances: HashMap::new(),
            adjust_instances: HashMap::new(),
        }
    }

    pub fn actions(&self) -> RangeActions {
        self.actions
    }

    /// Bind the default-instance "set" callback. The callback may rewrite
    /// the value to reflect the clamped/actual result.
    pub fn on_value(&mut self, cb: impl FnMut(&DeviceId, &mut i64) -> bool + 'static) {
        self.set_default = Some(Box::new(cb));
    }

    /// Bind the default-instance "adjust" callback: delta in, absolute
    /// resulting value out through the same reference.
    pub fn on_adjust_value(&mut self, cb: impl FnMut(&DeviceId, &mut i64) -> bool + 'static) {
        self.adjust_default = Some(Box::new(cb));
    }

    pub fn on_value_int(
        &mut self,
        instance: impl Into<String>,
        cb: impl FnMut(&DeviceId, &str, &mut i64) -> bool + 'static,
    ) {
        self.set_instances
            .insert(instance.into(), InstanceCallback::Int(Box::new(cb)));
    }

    pub fn on_value_float(
        &mut self,
        instance: impl Into<String>,
        cb: impl FnMut(&DeviceId, &str, &mut f64) -> bool + 'static,
    ) {
        self.set_instances
            .insert(instance.into(), InstanceCallback::Float(Box::new(cb)));
    }

    pub fn on_adjust_value_int(
        &mut self,
        instance: impl Into<String>,
        cb: impl FnMut(&DeviceId, &str, &mut i64) -> bool + 'static,
    ) {
        self.adjust_instances
            .insert(instance.into(), InstanceCallback::Int(Box::new(cb)));
    }

    pub fn on_adjust_value_float(
        &mut self,
        instance: impl Into<String>,
        cb: impl FnMut(&DeviceId, &str, &mut f64) -> bool + 'static,
    ) {
        self.adjust_instances
            .insert(instance.into(), InstanceCallback::Float(Box::new(cb)));
    }

    /// Draft a state event for the default instance.
    pub fn value_event(&self, value: impl Into<RangeValue>) -> EventDraft {
        EventDraft::new(self.actions.set, self.value_object(value.into()))
    }

    /// Draft a state event for a named instance.
    pub fn instance_value_event(
        &self,
        instance: impl Into<String>,
        value: impl Into<RangeValue>,
    ) -> EventDraft {
        EventDraft::new(self.actions.set, self.value_object(value.into())).for_instance(instance)
    }

    fn value_object(&self, value: RangeValue) -> Value {
        let mut object = Map::new();
        object.insert(self.actions.value_field.to_string(), value.into());
        Value::Object(object)
    }

    fn run_default(
        cb: Option<&mut DefaultRangeCallback>,
        device_id: &DeviceId,
        field: &str,
        raw: &Value,
        response_value: &mut Value,
    ) -> Dispatch {
        let mut value = raw.as_i64().unwrap_or(0);
        let success = match cb {
            Some(cb) => cb(device_id, &mut value),
            None => false,
        };
        response_value[field] = Value::from(value);
        Dispatch::Handled(success)
    }

    fn run_instance(
        cb: &mut InstanceCallback,
        device_id: &DeviceId,
        instance: &str,
        field: &str,
        raw: &Value,
        response_value: &mut Value,
    ) -> Dispatch {
        match cb {
            InstanceCallback::Int(cb) => {
                let mut value = raw.as_i64().unwrap_or(0);
                let success = cb(device_id, instance, &mut value);
                response_value[field] = Value::from(value);
                Dispatch::Handled(success)
            }
            InstanceCallback::Float(cb) => {
                let mut value = raw.as_f64().unwrap_or(0.0);
                let success = cb(device_id, instance, &mut value);
                response_value[field] = Value::from(value);
                Dispatch::Handled(success)
            }
        }
    }
}

impl CapabilityHandler for RangeController {
    fn matches(&self, action: &str) -> bool {
        action == self.actions.set || action == self.actions.adjust
    }

    fn invoke(&mut self, device_id: &DeviceId, request: &mut CapabilityRequest<'_>) -> Dispatch {
        let (input_field, default_cb, instances) = if request.action == self.actions.set {
            (
                self.actions.value_field,
                self.set_default.as_mut(),
                &mut self.set_instances,
            )
        } else if request.action == self.actions.adjust {
            (
                self.actions.delta_field,
                self.adjust_default.as_mut(),
                &mut self.adjust_instances,
            )
        } else {
            return Dispatch::Unclaimed;
        };

        let raw = &request.request_value[input_field];

        if request.instance.is_empty() {
            return Self::run_default(
                default_cb,
                device_id,
                self.actions.value_field,
                raw,
                request.response_value,
            );
        }

        // The response always reports the absolute value field, for
        // adjusts too.
        match instances.get_mut(request.instance) {
            Some(cb) => Self::run_instance(
                cb,
                device_id,
                request.instance,
                self.actions.value_field,
                raw,
                request.response_value,
            ),
            None => Dispatch::Unclaimed,
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
