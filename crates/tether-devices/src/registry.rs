use crate::{Device, DeviceId, DeviceProfile};

/// Owner of all known devices, keyed by identifier.
///
/// Devices are created lazily on first reference and never removed. The
/// roster is small; lookup is a linear scan.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| d.id() == id)
    }

    pub fn get_mut(&mut self, id: &DeviceId) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.id() == id)
    }

    pub fn contains(&self, id: &DeviceId) -> bool {
        self.get(id).is_some()
    }

    /// Return the existing device or build one from the profile's
    /// capability handlers. A device with an invalid id is still created
    /// and usable in memory, but it never joins the connect roster.
    pub fn get_or_create<P: DeviceProfile>(&mut self, id: DeviceId) -> &mut Device {
        if let Some(pos) = self.devices.iter().position(|d| d.id() == &id) {
            return &mut self.devices[pos];
        }
        if id.is_valid() {
            tracing::info!(device_id = %id, kind = P::KIND, "creating device");
        } else {
            tracing::warn!(
                device_id = %id,
                "device id is invalid; device is created but will never exchange messages"
            );
        }
        let mut device = Device::new(id, P::KIND);
        for handler in P::handlers() {
            device.register(handler);
        }
        self.devices.push(device);
        let last = self.devices.len() - 1;
        &mut self.devices[last]
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Ids presented to the broker on connect; invalid ids are excluded.
    pub fn valid_ids(&self) -> Vec<String> {
        self.devices
            .iter()
            .filter(|d| d.id().is_valid())
            .map(|d| d.id().as_str().to_string())
            .collect()
    }

    pub fn has_valid_device(&self) -> bool {
        self.devices.iter().any(|d| d.id().is_valid())
    }
}
