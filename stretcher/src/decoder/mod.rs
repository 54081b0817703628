//! Reconstruction of diagnostic [`Event`]s from the telemetry byte stream.
//!
//! The [`Decoder`] is a pure state machine: it is fed one byte at a time and
//! returns the events that byte completes. [`decode`] wraps it into a lazy
//! iterator over any byte source.

use arrayvec::ArrayVec;
use log::warn;

pub use event::{DecoderPhase, Event};

use crate::{
    codec::{decode_measurement, Marker, Symbol, MAX_NIBBLES},
    config::MEASUREMENT_COUNT,
};

mod event;

/// Most events a single byte can complete. Only the end of training yields
/// two.
pub const MAX_EVENTS_PER_BYTE: usize = 2;

/// Events completed by a single byte
pub type DecodedEvents = ArrayVec<Event, MAX_EVENTS_PER_BYTE>;

macro_rules! events {
    [] => {
        DecodedEvents::new()
    };
    [$($event:expr),+ $(,)?] => {
        {
            let mut list = DecodedEvents::new();
            $(list.push($event);)+
            list
        }
    };
}

/// Byte-at-a-time telemetry decoder.
///
/// # Tolerance
/// The decoder never fails. Bytes that make no sense in the current phase
/// are reported as [`Event::Unhandled`]. This includes a ninth nibble in one
/// measurement, which would not fit a `u32`.
///
/// A training phase is expected to carry exactly [`MEASUREMENT_COUNT`]
/// measurements. Surplus measurements are dropped and missing ones are
/// reported as `0`, both with a warning.
#[derive(Debug, Default, Clone)]
pub struct Decoder {
    phase: DecoderPhase,
    nibbles: ArrayVec<u8, MAX_NIBBLES>,
    measurements: ArrayVec<u32, MEASUREMENT_COUNT>,
    dropped: usize,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DecoderPhase {
        self.phase
    }

    /// Feed a single byte, returning the events it completes
    pub fn feed(&mut self, byte: u8) -> DecodedEvents {
        let unhandled = Event::Unhandled {
            phase: self.phase,
            byte,
        };

        match (self.phase, Symbol::from(byte)) {
            (DecoderPhase::Idle, Symbol::Marker(Marker::Start)) => {
                self.clear();
                self.phase = DecoderPhase::Training;
                events![Event::StartTraining]
            }
            (DecoderPhase::Idle, _) => events![unhandled],

            (DecoderPhase::Training, Symbol::Nibble(nibble)) => {
                if self.nibbles.try_push(nibble).is_err() {
                    warn!("Measurement exceeds {MAX_NIBBLES} nibbles, ignoring {byte:#04x}");
                    events![unhandled]
                } else {
                    events![]
                }
            }
            (DecoderPhase::Training, Symbol::Marker(Marker::Measured)) => {
                if self.nibbles.is_empty() {
                    self.finish_training()
                } else {
                    let value = decode_measurement(&self.nibbles);
                    self.nibbles.clear();
                    if self.measurements.try_push(value).is_err() {
                        warn!("Dropping surplus measurement {value}");
                        self.dropped += 1;
                    }
                    events![]
                }
            }
            (DecoderPhase::Training, Symbol::Marker(Marker::Finish)) => {
                // The device uses one marker for both an aborted training
                // and the end of stretching.
                self.clear();
                self.phase = DecoderPhase::Idle;
                events![Event::FinishStretching]
            }
            (DecoderPhase::Training, _) => events![unhandled],

            (DecoderPhase::Stretching, Symbol::Marker(Marker::Finish)) => {
                self.phase = DecoderPhase::Idle;
                events![Event::FinishStretching]
            }
            (DecoderPhase::Stretching, _) => events![unhandled],
        }
    }

    fn finish_training(&mut self) -> DecodedEvents {
        if self.measurements.len() < MEASUREMENT_COUNT {
            warn!(
                "Training finished with {} of {MEASUREMENT_COUNT} measurements",
                self.measurements.len()
            );
        }
        if self.dropped > 0 {
            warn!(
                "Training finished with {} surplus measurements",
                self.dropped
            );
        }

        let mut measurements = [0; MEASUREMENT_COUNT];
        measurements[..self.measurements.len()].copy_from_slice(&self.measurements);

        self.clear();
        self.phase = DecoderPhase::Stretching;
        events![
            Event::FinishTraining { measurements },
            Event::StartStretching,
        ]
    }

    fn clear(&mut self) {
        self.nibbles.clear();
        self.measurements.clear();
        self.dropped = 0;
    }
}

/// Lazily decode a byte source into [`Event`]s.
///
/// Bytes are pulled from the source only when no decoded event is pending,
/// so at most one byte is read ahead of the events returned.
pub fn decode<I: IntoIterator<Item = u8>>(bytes: I) -> Events<I::IntoIter> {
    Events {
        bytes: bytes.into_iter(),
        decoder: Decoder::new(),
        pending: DecodedEvents::new().into_iter(),
    }
}

/// Iterator returned by [`decode`]
#[derive(Debug)]
#[must_use]
pub struct Events<I> {
    bytes: I,
    decoder: Decoder,
    pending: arrayvec::IntoIter<Event, MAX_EVENTS_PER_BYTE>,
}

impl<I> Events<I> {
    /// The decoder driving this iterator
    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }
}

impl<I: Iterator<Item = u8>> Iterator for Events<I> {
    type Item = Event;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.next() {
                return Some(event);
            }

            let byte = self.bytes.next()?;
            self.pending = self.decoder.feed(byte).into_iter();
        }
    }
}
