//! RGB color and color temperature capabilities for lights.

use crate::{CapabilityHandler, CapabilityRequest, DeviceId, Dispatch, EventDraft};
use serde_json::{json, Value};
use std::any::Any;

pub const SET_COLOR: &str = "setColor";
pub const SET_COLOR_TEMPERATURE: &str = "setColorTemperature";
pub const INCREASE_COLOR_TEMPERATURE: &str = "increaseColorTemperature";
pub const DECREASE_COLOR_TEMPERATURE: &str = "decreaseColorTemperature";

/// One RGB triple as the broker sends it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn from_value(value: &Value) -> Self {
        let channel = |name: &str| value[name].as_u64().unwrap_or(0).min(255) as u8;
        Self {
            r: channel("r"),
            g: channel("g"),
            b: channel("b"),
        }
    }

    fn to_value(self) -> Value {
        json!({ "r": self.r, "g": self.g, "b": self.b })
    }
}

pub type ColorCallback = Box<dyn FnMut(&DeviceId, &mut Color) -> bool>;

/// RGB color capability. No instances.
#[derive(Default)]
pub struct ColorController {
    callback: Option<ColorCallback>,
}

impl ColorController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_color(&mut self, cb: impl FnMut(&DeviceId, &mut Color) -> bool + 'static) {
        self.callback = Some(Box::new(cb));
    }

    pub fn color_event(&self, color: Color) -> EventDraft {
        EventDraft::new(SET_COLOR, json!({ "color": color.to_value() }))
    }
}

impl CapabilityHandler for ColorController {
    fn matches(&self, action: &str) -> bool {
        action == SET_COLOR
    }

    fn invoke(&mut self, device_id: &DeviceId, request: &mut CapabilityRequest<'_>) -> Dispatch {
        let mut color = Color::from_value(&request.request_value["color"]);
        let success = match self.callback.as_mut() {
            Some(cb) => cb(device_id, &mut color),
            None => false,
        };
        request.response_value["color"] = color.to_value();
        Dispatch::Handled(success)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub type ColorTemperatureCallback = Box<dyn FnMut(&DeviceId, &mut i64) -> bool>;

/// Color temperature in Kelvin. The set action carries the requested value;
/// increase/decrease carry the current value and the callback writes back
/// the next step.
#[derive(Default)]
pub struct ColorTemperatureController {
    set: Option<ColorTemperatureCallback>,
    increase: Option<ColorTemperatureCallback>,
    decrease: Option<ColorTemperatureCallback>,
}

impl ColorTemperatureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_color_temperature(&mut self, cb: impl FnMut(&DeviceId, &mut i64) -> bool + 'static) {
        self.set = Some(Box::new(cb));
    }

    pub fn on_increase_color_temperature(
        &mut self,
        cb: impl FnMut(&DeviceId, &mut i64) -> bool + 'static,
    ) {
        self.increase = Some(Box::new(cb));
    }

    pub fn on_decrease_color_temperature(
        &mut self,
        cb: impl FnMut(&DeviceId, &mut i64) -> bool + 'static,
    ) {
        self.decrease = Some(Box::new(cb));
    }

    pub fn color_temperature_event(&self, kelvin: i64) -> EventDraft {
        EventDraft::new(SET_COLOR_TEMPERATURE, json!({ "colorTemperature": kelvin }))
    }
}

impl CapabilityHandler for ColorTemperatureController {
    fn matches(&self, action: &str) -> bool {
        action == SET_COLOR_TEMPERATURE
            || action == INCREASE_COLOR_TEMPERATURE
            || action == DECREASE_COLOR_TEMPERATURE
    }

    fn invoke(&mut self, device_id: &DeviceId, request: &mut CapabilityRequest<'_>) -> Dispatch {
        let cb = match request.action {
            SET_COLOR_TEMPERATURE => self.set.as_mut(),
            INCREASE_COLOR_TEMPERATURE => self.increase.as_mut(),
            DECREASE_COLOR_TEMPERATURE => self.decrease.as_mut(),
            _ => return Dispatch::Unclaimed,
        };
        let mut kelvin = request.request_value["colorTemperature"].as_i64().unwrap_or(0);
        let success = match cb {
            Some(cb) => cb(device_id, &mut kelvin),
            None => false,
        };
        request.response_value["colorTemperature"] = Value::from(kelvin);
        Dispatch::Handled(success)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
