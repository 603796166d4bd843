// src/devices/registry.rs

use std::collections::BTreeMap;

use log::debug;

use crate::devices::Device;
use crate::utils::{DeviceConfig, G6Error, ScaleConfig};

/// Maps opaque integer handles to independent emulated devices.
///
/// Every open handle owns its own particle store, pipe array and neighbour
/// state; nothing is shared between handles, so they can be driven
/// concurrently without synchronization inside the engine. The registry also
/// carries the process-wide [`ScaleConfig`], because the hardware library's
/// unit setters are global rather than per-device.
///
/// # Example
///
/// ```
/// use g6_emu::devices::DeviceRegistry;
///
/// let mut registry = DeviceRegistry::new();
/// registry.open(0);
/// assert_eq!(registry.npipes(), 48);
/// registry.close(0).expect("Failed to close device");
/// assert!(registry.close(0).is_err(), "A handle closes exactly once");
/// ```
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<i32, Device>,
    config: DeviceConfig,
    scale: ScaleConfig,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::with_config(DeviceConfig::default())
    }

    /// A registry whose devices open with a non-default hardware model
    /// (pipe count, store capacity).
    pub fn with_config(config: DeviceConfig) -> Self {
        Self {
            devices: BTreeMap::new(),
            config,
            scale: ScaleConfig::default(),
        }
    }

    /// Opens `id`, creating a fresh device. Re-opening an id that is already
    /// open resets it to the just-opened state; callers that accidentally
    /// double-open observe an empty store either way.
    pub fn open(&mut self, id: i32) -> &mut Device {
        debug!("opening device handle {}", id);
        let config = self.config;
        self.devices
            .entry(id)
            .and_modify(|dev| dev.reset())
            .or_insert_with(|| Device::new(config))
    }

    /// Closes `id`, releasing its store, pipe and neighbour state.
    ///
    /// # Errors
    ///
    /// Returns [`G6Error::InvalidHandle`] if `id` is not open.
    pub fn close(&mut self, id: i32) -> Result<(), G6Error> {
        debug!("closing device handle {}", id);
        self.devices
            .remove(&id)
            .map(|_| ())
            .ok_or(G6Error::InvalidHandle(id))
    }

    pub fn device(&self, id: i32) -> Result<&Device, G6Error> {
        self.devices.get(&id).ok_or(G6Error::InvalidHandle(id))
    }

    pub fn device_mut(&mut self, id: i32) -> Result<&mut Device, G6Error> {
        self.devices.get_mut(&id).ok_or(G6Error::InvalidHandle(id))
    }

    /// The lowest open handle, if any. Serves the handle-less debug accessor
    /// of the hardware ABI.
    pub fn first_open(&self) -> Option<(i32, &Device)> {
        self.devices.iter().next().map(|(id, dev)| (*id, dev))
    }

    /// The fixed pipe count devices open with. A hardware constant, not
    /// per-call negotiable.
    pub fn npipes(&self) -> usize {
        self.config.pipe_count
    }

    pub fn set_tunit(&mut self, tunit: f64) {
        self.scale.tunit = tunit;
    }

    pub fn set_xunit(&mut self, xunit: f64) {
        self.scale.xunit = xunit;
    }

    pub fn scale(&self) -> ScaleConfig {
        self.scale
    }
}
