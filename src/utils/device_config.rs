// src/utils/device_config.rs
use crate::utils::DEFAULT_DEVICE_CONFIG;

/// Hardware-model constants for one emulated GRAPE-6 device.
///
/// The defaults reproduce the board-level figures of the real hardware: 48
/// pipelines per cluster and room for 16384 j-particles in on-board memory.
/// Both are per-handle configuration, fixed at open time, never per-call.
#[derive(Debug, Clone, Copy)]
pub struct DeviceConfig {
    /// Number of parallel force pipelines, the upper bound on `ni` per batch.
    pub pipe_count: usize,
    /// Number of j-particle slots in the store, the upper bound on addresses.
    pub store_capacity: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DEFAULT_DEVICE_CONFIG
    }
}

impl DeviceConfig {
    pub fn new(pipe_count: Option<usize>, store_capacity: Option<usize>) -> Self {
        let default = DEFAULT_DEVICE_CONFIG;
        Self {
            pipe_count: pipe_count.unwrap_or(default.pipe_count),
            store_capacity: store_capacity.unwrap_or(default.store_capacity),
        }
    }
}
