use std::fmt;
use std::error::Error;

/// Status value returned by every entry point on success.
pub const STATUS_OK: i32 = 0;

/// Represents errors that can occur while driving an emulated GRAPE-6 device.
#[derive(Debug, Clone)]
pub enum G6Error {
    /// Indicates an operation on a device handle that is not currently open.
    InvalidHandle(i32),
    /// Indicates a j-particle address outside the store's allocated capacity.
    InvalidAddress { address: i32, capacity: usize },
    /// Indicates a batch larger than the device's pipe count.
    CapacityExceeded { requested: usize, pipes: usize },
    /// Indicates a j-particle range beyond the populated part of the store.
    OutOfRange { requested: usize, populated: usize },
    /// Indicates a phase-2 call with no matching phase-1 call on the same handle.
    StaleCallOrder,
    /// Indicates a neighbour list truncated to the caller-supplied maximum length.
    /// This is a saturation condition, not a failure: the truncated data is valid.
    ListOverflow { found: usize, copied: usize },
    /// A general error for calculations that produce invalid results.
    CalculationError(String),
}

impl G6Error {
    /// Maps the error onto the integer status convention of the GRAPE-6 ABI:
    /// `0` success, negative fatal, positive non-fatal saturation.
    pub fn status_code(&self) -> i32 {
        match self {
            G6Error::InvalidHandle(_) => -1,
            G6Error::InvalidAddress { .. } => -2,
            G6Error::CapacityExceeded { .. } => -3,
            G6Error::OutOfRange { .. } => -4,
            G6Error::StaleCallOrder => -5,
            G6Error::CalculationError(_) => -6,
            G6Error::ListOverflow { .. } => 1,
        }
    }
}

impl fmt::Display for G6Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            G6Error::InvalidHandle(id) => write!(f, "Device handle {} is not open", id),
            G6Error::InvalidAddress { address, capacity } =>
                write!(f, "J-particle address {} outside store capacity {}", address, capacity),
            G6Error::CapacityExceeded { requested, pipes } =>
                write!(f, "Batch of {} i-particles exceeds pipe count {}", requested, pipes),
            G6Error::OutOfRange { requested, populated } =>
                write!(f, "Requested {} j-particles but only {} are populated", requested, populated),
            G6Error::StaleCallOrder => write!(f, "Phase-2 call without a matching phase-1 call"),
            G6Error::ListOverflow { found, copied } =>
                write!(f, "Neighbour list truncated: {} found, {} copied", found, copied),
            G6Error::CalculationError(msg) => write!(f, "Calculation error: {}", msg),
        }
    }
}

impl Error for G6Error {}
