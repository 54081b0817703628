//! Stretcher observes a shared clock line, measures its natural timing with
//! single-tick resolution, and replays that timing by stretching the line.
//!
//! # Device and host
//! The crate is split along the telemetry channel between the two sides:
//!
//! * The [`device`] core is a tick-driven state machine. It is fed the
//!   sampled line and trigger levels once per tick and returns the line
//!   override and telemetry bytes for that tick. It never blocks and never
//!   allocates, so it can run on a microcontroller or inside a simulation.
//! * The [`decoder`] runs on the host. It turns the telemetry byte stream
//!   back into diagnostic [`Event`](`decoder::Event`)s.
//!
//! Both sides share the wire format described in [`codec`].
//!
//! `stretcher` does not touch any hardware or serial port itself. The
//! `stretcher-linux` crate provides a host tool that reads telemetry from a
//! serial device and a simulated bus to exercise the device core.
//!
//! # Example
//! ```
//! use stretcher::{
//!     config::DeviceConfig,
//!     decoder::{decode, Event},
//!     device::{ClockStretcher, TickInput},
//! };
//!
//! let mut device = ClockStretcher::new(DeviceConfig::default());
//! let mut telemetry = Vec::new();
//!
//! let levels = [true, true, false, false, true, true, false, false, true];
//! for (tick, line_level) in levels.into_iter().enumerate() {
//!     let output = device.tick(TickInput::new(line_level, tick == 1));
//!     telemetry.extend_from_slice(output.telemetry());
//! }
//!
//! let events: Vec<_> = decode(telemetry).collect();
//! assert_eq!(events[1], Event::FinishTraining { measurements: [2, 2, 2] });
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

pub mod codec;
pub mod config;
mod counter;
pub mod decoder;
pub mod device;
