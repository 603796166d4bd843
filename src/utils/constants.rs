use crate::utils;

pub const DEFAULT_DEVICE_CONFIG: utils::DeviceConfig = utils::DeviceConfig {
    pipe_count: 48,
    store_capacity: 16_384,
};
