pub mod errors;

mod device_config;
mod constants;
mod scale_config;

pub use errors::{G6Error, STATUS_OK};
pub use device_config::DeviceConfig;
pub use constants::*;
pub use scale_config::ScaleConfig;
