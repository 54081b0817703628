use arrayvec::ArrayVec;

use crate::codec::MAX_ENCODED_LEN;

/// Most telemetry bytes a single tick can produce: one full measurement
/// followed by the end-of-training marker.
pub const MAX_TICK_BYTES: usize = MAX_ENCODED_LEN + 1;

/// Telemetry bytes produced during one tick, in wire order
pub type TelemetryBytes = ArrayVec<u8, MAX_TICK_BYTES>;

/// Sampled inputs for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Level of the observed clock line
    pub line_level: bool,
    /// Raw level of the trigger button; a press is its rising edge
    pub trigger: bool,
}

impl TickInput {
    pub fn new(line_level: bool, trigger: bool) -> Self {
        Self {
            line_level,
            trigger,
        }
    }

    /// Sample with the trigger released
    pub fn line(line_level: bool) -> Self {
        Self::new(line_level, false)
    }
}

/// Everything the core drives during one tick.
///
/// The caller should apply [`line_override`](`Self::line_override`) to the
/// line driver and push [`telemetry`](`Self::telemetry`) into the serial
/// transmitter before the next tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct TickOutput {
    /// Pull the line low
    pub line_override: bool,
    /// The core is not idle. Suitable for a status LED.
    pub active: bool,
    /// Telemetry bytes to transmit
    pub telemetry: TelemetryBytes,
}

impl TickOutput {
    pub fn telemetry(&self) -> &[u8] {
        &self.telemetry
    }
}
