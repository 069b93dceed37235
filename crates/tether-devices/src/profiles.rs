use crate::{
    CapabilityHandler, ColorController, ColorTemperatureController, PowerStateController,
    RangeController, ThermostatController, BRIGHTNESS, RANGE_VALUE,
};

/// A capability composition for one device type.
///
/// A device built from a profile gets the profile's handlers, in order,
/// at construction time; bindings are attached afterwards through
/// `Device::capability_mut`.
pub trait DeviceProfile {
    /// Type label reported to the broker.
    const KIND: &'static str;

    fn handlers() -> Vec<Box<dyn CapabilityHandler>>;
}

/// On/off only.
pub struct Switch;

impl DeviceProfile for Switch {
    const KIND: &'static str = "SWITCH";

    fn handlers() -> Vec<Box<dyn CapabilityHandler>> {
        vec![Box::new(PowerStateController::new())]
    }
}

/// On/off, brightness, RGB color, and color temperature.
pub struct Light;

impl DeviceProfile for Light {
    const KIND: &'static str = "LIGHT";

    fn handlers() -> Vec<Box<dyn CapabilityHandler>> {
        vec![
            Box::new(PowerStateController::new()),
            Box::new(RangeController::new(BRIGHTNESS)),
            Box::new(ColorController::new()),
            Box::new(ColorTemperatureController::new()),
        ]
    }
}

/// On/off plus a position range.
pub struct Blinds;

impl DeviceProfile for Blinds {
    const KIND: &'static str = "BLINDS";

    fn handlers() -> Vec<Box<dyn CapabilityHandler>> {
        vec![
            Box::new(PowerStateController::new()),
            Box::new(RangeController::new(RANGE_VALUE)),
        ]
    }
}

/// On/off plus a range capability meant to be bound per instance
/// (e.g. speed and swing on one unit).
pub struct Fan;

impl DeviceProfile for Fan {
    const KIND: &'static str = "FAN";

    fn handlers() -> Vec<Box<dyn CapabilityHandler>> {
        vec![
            Box::new(PowerStateController::new()),
            Box::new(RangeController::new(RANGE_VALUE)),
        ]
    }
}

/// Window air conditioner: on/off, a fan-speed range, and a thermostat.
pub struct AcUnit;

impl DeviceProfile for AcUnit {
    const KIND: &'static str = "AC_UNIT";

    fn handlers() -> Vec<Box<dyn CapabilityHandler>> {
        vec![
            Box::new(PowerStateController::new()),
            Box::new(RangeController::new(RANGE_VALUE)),
            Box::new(ThermostatController::new()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Device, DeviceId};
    use serde_json::json;

    fn build<P: DeviceProfile>() -> Device {
        let mut device = Device::new(DeviceId::new("aabbccddeeff001122334455"), P::KIND);
        for handler in P::handlers() {
            device.register(handler);
        }
        device
    }

    #[test]
    fn light_composes_power_brightness_and_color() {
        let mut device = build::<Light>();
        let mut response = json!({});
        assert!(device
            .handle_request("setPowerState", "", &json!({"state": "On"}), &mut response)
            .is_some());
        assert!(device
            .handle_request("setBrightness", "", &json!({"brightness": 40}), &mut response)
            .is_some());
        assert!(device
            .handle_request(
                "setColor",
                "",
                &json!({"color": {"r": 1, "g": 2, "b": 3}}),
                &mut response
            )
            .is_some());
        assert!(device
            .handle_request(
                "setColorTemperature",
                "",
                &json!({"colorTemperature": 2700}),
                &mut response
            )
            .is_some());
        assert!(device
            .handle_request("setRangeValue", "", &json!({"rangeValue": 1}), &mut response)
            .is_none());
    }

    #[test]
    fn ac_unit_composes_power_range_and_thermostat() {
        let mut device = build::<AcUnit>();
        assert_eq!(device.kind(), "AC_UNIT");
        let mut response = json!({});
        assert!(device
            .handle_request(
                "targetTemperature",
                "",
                &json!({"temperature": 22.0}),
                &mut response
            )
            .is_some());
        assert_eq!(response["temperature"], 22.0);
        assert!(device
            .handle_request("setRangeValue", "", &json!({"rangeValue": 2}), &mut response)
            .is_some());
        assert!(device
            .handle_request(
                "setThermostatMode",
                "",
                &json!({"thermostatMode": "COOL"}),
                &mut response
            )
            .is_some());
        assert!(device
            .handle_request("setColor", "", &json!({}), &mut response)
            .is_none());
    }
}
