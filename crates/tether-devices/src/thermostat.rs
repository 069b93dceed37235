//! Thermostat capability: target temperature plus operating mode.
//!
//! Temperatures are floats on the wire (half-degree setpoints are common)
//! and both directions report the absolute `temperature` field back, the
//! adjust action included. The mode is a free string the broker constrains
//! to AUTO, COOL or HEAT.

use crate::{CapabilityHandler, CapabilityRequest, DeviceId, Dispatch, EventDraft};
use serde_json::{json, Value};
use std::any::Any;

pub const TARGET_TEMPERATURE: &str = "targetTemperature";
pub const ADJUST_TARGET_TEMPERATURE: &str = "adjustTargetTemperature";
pub const SET_THERMOSTAT_MODE: &str = "setThermostatMode";

pub type TemperatureCallback = Box<dyn FnMut(&DeviceId, &mut f64) -> bool>;
pub type ThermostatModeCallback = Box<dyn FnMut(&DeviceId, &mut String) -> bool>;

/// Handler for the thermostat actions on one device. No instances.
#[derive(Default)]
pub struct ThermostatController {
    set_temperature: Option<TemperatureCallback>,
    adjust_temperature: Option<TemperatureCallback>,
    mode: Option<ThermostatModeCallback>,
}

impl ThermostatController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the absolute setpoint callback. The callback may rewrite the
    /// value to reflect the clamped/actual setpoint.
    pub fn on_target_temperature(&mut self, cb: impl FnMut(&DeviceId, &mut f64) -> bool + 'static) {
        self.set_temperature = Some(Box::new(cb));
    }

    /// Bind the relative setpoint callback: delta in, absolute resulting
    /// setpoint out through the same reference.
    pub fn on_adjust_target_temperature(
        &mut self,
        cb: impl FnMut(&DeviceId, &mut f64) -> bool + 'static,
    ) {
        self.adjust_temperature = Some(Box::new(cb));
    }

    pub fn on_thermostat_mode(
        &mut self,
        cb: impl FnMut(&DeviceId, &mut String) -> bool + 'static,
    ) {
        self.mode = Some(Box::new(cb));
    }

    pub fn target_temperature_event(&self, temperature: f64) -> EventDraft {
        EventDraft::new(TARGET_TEMPERATURE, json!({ "temperature": temperature }))
    }

    pub fn thermostat_mode_event(&self, mode: impl Into<String>) -> EventDraft {
        EventDraft::new(SET_THERMOSTAT_MODE, json!({ "thermostatMode": mode.into() }))
    }

    fn run_temperature(
        cb: Option<&mut TemperatureCallback>,
        device_id: &DeviceId,
        raw: &Value,
        response_value: &mut Value,
    ) -> Dispatch {
        let mut temperature = raw.as_f64().unwrap_or(0.0);
        let success = match cb {
            Some(cb) => cb(device_id, &mut temperature),
            None => false,
        };
        response_value["temperature"] = Value::from(temperature);
        Dispatch::Handled(success)
    }
}

impl CapabilityHandler for ThermostatController {
    fn matches(&self, action: &str) -> bool {
        action == TARGET_TEMPERATURE
            || action == ADJUST_TARGET_TEMPERATURE
            || action == SET_THERMOSTAT_MODE
    }

    fn invoke(&mut self, device_id: &DeviceId, request: &mut CapabilityRequest<'_>) -> Dispatch {
        match request.action {
            TARGET_TEMPERATURE => Self::run_temperature(
                self.set_temperature.as_mut(),
                device_id,
                &request.request_value["temperature"],
                request.response_value,
            ),
            ADJUST_TARGET_TEMPERATURE => Self::run_temperature(
                self.adjust_temperature.as_mut(),
                device_id,
                &request.request_value["temperature"],
                request.response_value,
            ),
            SET_THERMOSTAT_MODE => {
                let mut mode = request.request_value["thermostatMode"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                let success = match self.mode.as_mut() {
                    Some(cb) => cb(device_id, &mut mode),
                    None => false,
                };
                request.response_value["thermostatMode"] = Value::from(mode);
                Dispatch::Handled(success)
            }
            _ => Dispatch::Unclaimed,
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
