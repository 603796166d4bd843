// src/utils/scale_config.rs

/// Process-wide unit scales established by the caller.
///
/// `set_tunit`/`set_xunit` record how the caller's time and length units map
/// onto the device's internal representation. The emulation computes in f64
/// throughout and never interprets these values; they are stored so that
/// callers written against the hardware library observe the same contract.
/// Both scales default to 1.0 and persist across device open/close.
#[derive(Debug, Clone, Copy)]
pub struct ScaleConfig {
    pub tunit: f64,
    pub xunit: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self { tunit: 1.0, xunit: 1.0 }
    }
}
