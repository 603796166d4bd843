#[cfg(feature = "ffi")]
pub mod g6;

#[cfg(test)]
#[cfg(feature = "ffi")]
mod g6_tests;
