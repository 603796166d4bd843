mod capabilities;
mod device;
mod registry;

pub use capabilities::*;
pub use device::*;
pub use registry::*;

#[cfg(test)]
mod registry_tests;
