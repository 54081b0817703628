/// Number of half-periods measured in one training cycle: `low0`, `high0`,
/// `low1`.
pub const MEASUREMENT_COUNT: usize = 3;

/// Static configuration of the device core.
///
/// Passed into [`ClockStretcher::new`](`crate::device::ClockStretcher::new`)
/// at construction, so the same core runs unchanged on every board and in
/// simulation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Rate of the tick clock driving the core
    pub tick_rate_hz: u32,

    /// Slowest bus clock the core is expected to measure. Together with
    /// [`tick_rate_hz`](`Self::tick_rate_hz`) this sizes the measurement
    /// counters; longer half-periods saturate.
    pub min_bus_frequency_hz: u32,
}

impl DeviceConfig {
    /// Saturation limit of a measurement counter, in ticks
    pub fn counter_max(&self) -> u32 {
        (self.tick_rate_hz / self.min_bus_frequency_hz.max(1)).saturating_add(1)
    }

    /// Saturation limit of the hold counter, twice the measurement width
    pub fn hold_max(&self) -> u32 {
        self.counter_max().saturating_mul(2)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 12_000_000,
            min_bus_frequency_hz: 100_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_counter_width() {
        let config = DeviceConfig::default();
        assert_eq!(config.counter_max(), 121);
        assert_eq!(config.hold_max(), 242);
    }

    #[test]
    fn zero_bus_frequency_does_not_divide_by_zero() {
        let config = DeviceConfig {
            tick_rate_hz: 1000,
            min_bus_frequency_hz: 0,
        };
        assert_eq!(config.counter_max(), 1001);
    }
}
