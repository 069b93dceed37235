//! tether-devices: devices, capabilities, and the registry
//!
//! A device is an addressable endpoint composed of capabilities. Each
//! capability registers one handler on the device; inbound requests walk
//! the handler list in registration order until one claims the action.

mod id;
pub use id::DeviceId;

mod device;
pub use device::{CapabilityHandler, CapabilityRequest, Device, Dispatch};

mod events;
pub use events::EventDraft;

mod range;
pub use range::{
    InstanceCallback, RangeActions, RangeController, RangeValue, BRIGHTNESS, RANGE_VALUE,
};

mod power;
pub use power::{PowerStateController, SET_POWER_STATE};

mod thermostat;
pub use thermostat::{
    ThermostatController, ADJUST_TARGET_TEMPERATURE, SET_THERMOSTAT_MODE, TARGET_TEMPERATURE,
};

mod color;
pub use color::{
    Color, ColorController, ColorTemperatureController, DECREASE_COLOR_TEMPERATURE,
    INCREASE_COLOR_TEMPERATURE, SET_COLOR, SET_COLOR_TEMPERATURE,
};

mod profiles;
pub use profiles::{AcUnit, Blinds, DeviceProfile, Fan, Light, Switch};

mod registry;
pub use registry::DeviceRegistry;
