//! Runs the device core against a [`SimulatedBus`] and decodes its telemetry

use serde::Serialize;
use stretcher::{
    config::DeviceConfig,
    decoder::{Decoder, Event},
    device::{ClockStretcher, TickInput},
};
use tracing::{debug, warn};

use crate::bus::SimulatedBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationParams {
    /// Low half-period of the simulated bus, in ticks
    pub low: u32,
    /// High half-period of the simulated bus, in ticks
    pub high: u32,
    /// Bus cycles to run before aborting
    pub cycles: usize,
    /// Ticks the bus idles high before its first cycle
    pub idle: u32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            low: 16,
            high: 16,
            cycles: 8,
            idle: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub ticks: u64,
    pub telemetry_bytes: usize,
    pub events: Vec<Event>,
    pub stretches: Vec<u32>,
}

struct Simulation {
    device: ClockStretcher,
    bus: SimulatedBus,
    decoder: Decoder,
    ticks: u64,
    telemetry_bytes: usize,
    events: Vec<Event>,
}

impl Simulation {
    fn tick(&mut self, trigger: bool) {
        let output = self.device.tick(TickInput::new(self.bus.level(), trigger));
        self.bus.step(output.line_override);
        self.ticks += 1;

        self.telemetry_bytes += output.telemetry().len();
        for &byte in output.telemetry() {
            self.events.extend(self.decoder.feed(byte));
        }
    }
}

/// Press the trigger, let the bus run for `params.cycles` cycles, then press
/// the trigger again to abort.
pub fn simulate(config: DeviceConfig, params: &SimulationParams) -> SimulationReport {
    // The trigger is pressed on the second tick, before the first edge
    let idle = params.idle.max(2);
    let mut simulation = Simulation {
        device: ClockStretcher::new(config),
        bus: SimulatedBus::new(params.low, params.high, idle),
        decoder: Decoder::new(),
        ticks: 0,
        telemetry_bytes: 0,
        events: Vec::new(),
    };

    let period = u64::from(params.low.max(1)) + u64::from(params.high.max(1));
    let limit = (params.cycles as u64 + 1) * 4 * period + u64::from(idle) + 16;

    simulation.tick(false);
    simulation.tick(true);
    while simulation.bus.cycles() < params.cycles {
        if simulation.ticks >= limit {
            warn!("Simulation did not complete {} cycles", params.cycles);
            break;
        }
        simulation.tick(false);
    }

    debug!(
        "Aborting after {} ticks in state {}",
        simulation.ticks,
        simulation.device.state()
    );
    simulation.tick(true);
    simulation.tick(false);

    SimulationReport {
        ticks: simulation.ticks,
        telemetry_bytes: simulation.telemetry_bytes,
        events: simulation.events,
        stretches: simulation.bus.stretches().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stretches_every_cycle_after_training() {
        let params = SimulationParams {
            low: 4,
            high: 4,
            cycles: 6,
            idle: 3,
        };
        let report = simulate(DeviceConfig::default(), &params);

        assert_eq!(report.stretches, [0, 0, 4, 4, 4, 4]);
        assert_eq!(
            report.events,
            [
                Event::StartTraining,
                Event::FinishTraining {
                    measurements: [4, 4, 4]
                },
                Event::StartStretching,
                Event::FinishStretching,
            ]
        );
    }

    #[test]
    fn stretch_matches_high_period() {
        let params = SimulationParams {
            low: 10,
            high: 7,
            cycles: 5,
            idle: 3,
        };
        let report = simulate(DeviceConfig::default(), &params);

        assert_eq!(report.stretches, [0, 0, 7, 7, 7]);
        assert_eq!(
            report.events[1],
            Event::FinishTraining {
                measurements: [10, 7, 10]
            }
        );
    }

    #[test]
    fn telemetry_size() {
        let params = SimulationParams {
            low: 0x12,
            high: 3,
            cycles: 3,
            idle: 3,
        };
        let report = simulate(DeviceConfig::default(), &params);

        // START, (2 + 1 + 2) nibbles, 3 markers, end of training, FINISH
        assert_eq!(report.telemetry_bytes, 1 + 5 + 3 + 1 + 1);
    }
}
