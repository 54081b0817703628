//! A simulated open-drain clock line with a single controller

/// Phase of the simulated bus controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Controller {
    /// Line released before the first cycle
    Idle { remaining: u32 },
    /// Driving the line low
    Low { remaining: u32 },
    /// Line released; counting high ticks once the line actually reads high
    Released { high_seen: u32 },
}

/// Clock line driven by a controller and possibly held low by the device.
///
/// The line level is the wired AND of both sides: it reads high only when
/// the controller released it and the device does not override it. The
/// controller honours stretching the way a bus controller does: after
/// releasing the line it waits for it to actually read high before timing
/// the high half-period.
#[derive(Debug, Clone)]
pub struct SimulatedBus {
    low: u32,
    high: u32,
    controller: Controller,
    line_override: bool,
    stretch: u32,
    stretches: Vec<u32>,
}

impl SimulatedBus {
    /// A bus with the given half-periods in ticks, idling high for
    /// `idle` ticks before the first cycle
    pub fn new(low: u32, high: u32, idle: u32) -> Self {
        Self {
            low: low.max(1),
            high: high.max(1),
            controller: Controller::Idle {
                remaining: idle.max(1),
            },
            line_override: false,
            stretch: 0,
            stretches: Vec::new(),
        }
    }

    /// Line level during the current tick
    pub fn level(&self) -> bool {
        let released = !matches!(self.controller, Controller::Low { .. });
        released && !self.line_override
    }

    /// Finish the current tick. The device override returned for this tick
    /// applies from the next one on.
    pub fn step(&mut self, line_override: bool) {
        let level = self.level();

        self.controller = match self.controller {
            Controller::Idle { remaining } if remaining > 1 => Controller::Idle {
                remaining: remaining - 1,
            },
            Controller::Idle { .. } => Controller::Low {
                remaining: self.low,
            },
            Controller::Low { remaining } if remaining > 1 => Controller::Low {
                remaining: remaining - 1,
            },
            Controller::Low { .. } => {
                self.stretch = 0;
                Controller::Released { high_seen: 0 }
            }
            Controller::Released { high_seen } if !level => {
                self.stretch += 1;
                Controller::Released { high_seen }
            }
            Controller::Released { high_seen } if high_seen + 1 >= self.high => {
                self.stretches.push(self.stretch);
                Controller::Low {
                    remaining: self.low,
                }
            }
            Controller::Released { high_seen } => Controller::Released {
                high_seen: high_seen + 1,
            },
        };

        self.line_override = line_override;
    }

    /// Number of completed bus cycles
    pub fn cycles(&self) -> usize {
        self.stretches.len()
    }

    /// Ticks the line stayed low after the controller released it, one entry
    /// per completed cycle
    pub fn stretches(&self) -> &[u32] {
        &self.stretches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(bus: &mut SimulatedBus, ticks: usize) -> Vec<bool> {
        (0..ticks)
            .map(|_| {
                let level = bus.level();
                bus.step(false);
                level
            })
            .collect()
    }

    #[test]
    fn free_running_clock() {
        let mut bus = SimulatedBus::new(2, 3, 1);
        assert_eq!(
            levels(&mut bus, 11),
            [true, false, false, true, true, true, false, false, true, true, true]
        );
        assert_eq!(bus.stretches(), [0, 0]);
    }

    #[test]
    fn controller_waits_for_release() {
        let mut bus = SimulatedBus::new(2, 2, 1);
        // idle
        assert!(bus.level());
        bus.step(false);

        // low phase, with the device holding on for three more ticks
        for _ in 0..2 {
            assert!(!bus.level());
            bus.step(true);
        }
        for _ in 0..3 {
            assert!(!bus.level());
            bus.step(true);
        }
        assert!(!bus.level());
        bus.step(false);

        assert_eq!(levels(&mut bus, 2), [true, true]);
        assert_eq!(bus.stretches(), [4]);
        assert!(!bus.level());
    }
}
