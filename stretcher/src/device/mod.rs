//! The tick-driven observer/replicator core.
//!
//! See [`ClockStretcher`] for a description of the state machine.

use log::{debug, trace};

pub use output::{TelemetryBytes, TickInput, TickOutput, MAX_TICK_BYTES};
pub use state::DeviceState;

use crate::{
    codec::{encode_end_of_training, encode_measurement, Marker},
    config::{DeviceConfig, MEASUREMENT_COUNT},
    counter::TickCounter,
};

mod output;
mod state;

/// Number of ticks to hold the line low, derived from the first low and
/// high half-periods of a training run.
///
/// This is `low0 + high0 - 2`, saturating at both ends: a sum below two
/// yields a hold of zero, which skips the hold entirely. Measurements taken
/// by [`ClockStretcher`] are always at least one tick, so the saturation
/// only matters for values coming from elsewhere.
pub fn hold_duration(low0: u32, high0: u32) -> u32 {
    low0.saturating_add(high0).saturating_sub(2)
}

/// Registers of the core. A tick computes the next set from a snapshot of
/// the current one and commits it as a whole.
#[derive(Debug, Clone, Copy)]
struct Registers {
    state: DeviceState,
    line_last: bool,
    trigger_last: bool,
    index: usize,
    measurements: [TickCounter; MEASUREMENT_COUNT],
    hold: u32,
    hold_elapsed: TickCounter,
}

impl Registers {
    fn new(config: &DeviceConfig) -> Self {
        Self {
            state: DeviceState::Idle,
            // An idle open-drain bus reads high
            line_last: true,
            trigger_last: false,
            index: 0,
            measurements: [TickCounter::new(config.counter_max()); MEASUREMENT_COUNT],
            hold: 0,
            hold_elapsed: TickCounter::new(config.hold_max()),
        }
    }
}

/// Observes a shared clock line and replays its timing by stretching it.
///
/// The core is driven by calling [`tick`](`Self::tick`) exactly once per
/// tick of its clock with the sampled [`TickInput`]. Every call performs one
/// state transition and returns the [`TickOutput`] for that tick.
///
/// # Operation
/// A trigger press in [`Idle`](`DeviceState::Idle`) starts a training run.
/// Starting at the next falling edge the core measures three consecutive
/// half-periods (`low0`, `high0`, `low1`) and reports each over telemetry.
/// It then waits for every following falling edge and holds the line low for
/// [`hold_duration(low0, high0)`](`hold_duration`) ticks, waits for the line
/// to read high again, and repeats.
///
/// A trigger press in any other state aborts the run, discarding everything
/// measured so far, and reports [`Marker::Finish`]. A press that coincides
/// with an edge or the end of a hold wins over it.
///
/// The first tick of every measurement counts as one: the tick on which the
/// edge is seen already belongs to the new half-period.
#[derive(Debug, Clone)]
pub struct ClockStretcher {
    config: DeviceConfig,
    registers: Registers,
}

impl ClockStretcher {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            registers: Registers::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn state(&self) -> DeviceState {
        self.registers.state
    }

    /// Current contents of the measurement counters
    pub fn measurements(&self) -> [u32; MEASUREMENT_COUNT] {
        self.registers.measurements.map(|counter| counter.value())
    }

    /// Hold duration of the current training run, once stretching started
    pub fn hold(&self) -> u32 {
        self.registers.hold
    }

    /// Advance the core by a single tick
    pub fn tick(&mut self, input: TickInput) -> TickOutput {
        let current = self.registers;
        let mut next = current;
        let mut telemetry = TelemetryBytes::new();

        let pressed = input.trigger && !current.trigger_last;
        let edge = input.line_level != current.line_last;
        let falling = edge && !input.line_level;

        next.line_last = input.line_level;
        next.trigger_last = input.trigger;

        match current.state {
            DeviceState::Idle => {
                if pressed {
                    telemetry.push(Marker::Start.byte());
                    next.state = DeviceState::TrainWait;
                }
            }
            DeviceState::Abort => {
                telemetry.push(Marker::Finish.byte());
                next.state = DeviceState::Idle;
            }
            _ if pressed => {
                next.state = DeviceState::Abort;
            }
            DeviceState::TrainWait => {
                if falling {
                    next.index = 0;
                    for counter in next.measurements.iter_mut() {
                        counter.reset();
                        counter.tick();
                    }
                    next.state = DeviceState::TrainCount;
                }
            }
            DeviceState::TrainCount => {
                let index = current.index;
                if !edge {
                    next.measurements[index].tick();
                } else {
                    let measured = current.measurements[index].value();

                    // Even indices time a low phase, so they must end rising
                    debug_assert_eq!(
                        input.line_level,
                        index % 2 == 0,
                        "measurement {index} ended on the wrong edge"
                    );
                    trace!("Measured half-period {index}: {measured} ticks");

                    telemetry.extend(encode_measurement(measured));

                    if index + 1 == MEASUREMENT_COUNT {
                        telemetry.extend(encode_end_of_training());
                        next.state = DeviceState::StretchWait;
                    } else {
                        next.index = index + 1;
                        next.measurements[index + 1].reset();
                        next.measurements[index + 1].tick();
                    }
                }
            }
            DeviceState::StretchWait => {
                if falling {
                    let [low0, high0, ..] = current.measurements.map(|counter| counter.value());
                    next.hold = hold_duration(low0, high0);
                    next.hold_elapsed.reset();
                    next.state = if next.hold == 0 {
                        DeviceState::HoldingDone
                    } else {
                        DeviceState::Holding
                    };
                }
            }
            DeviceState::Holding => {
                next.hold_elapsed.tick();
                if next.hold_elapsed.value() >= current.hold || next.hold_elapsed.is_saturated() {
                    next.state = DeviceState::HoldingDone;
                }
            }
            DeviceState::HoldingDone => {
                if input.line_level {
                    next.state = DeviceState::StretchWait;
                }
            }
        }

        if next.state != current.state {
            debug!("Device state {} -> {}", current.state, next.state);
        }

        self.registers = next;

        TickOutput {
            line_override: current.state == DeviceState::Holding,
            active: current.state.is_active(),
            telemetry,
        }
    }
}

impl Default for ClockStretcher {
    fn default() -> Self {
        Self::new(DeviceConfig::default())
    }
}
