use core::fmt::{Display, Formatter};

use crate::config::MEASUREMENT_COUNT;

/// Phase of the telemetry stream as seen by the [`Decoder`](`super::Decoder`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DecoderPhase {
    #[default]
    Idle,
    Training,
    Stretching,
}

impl Display for DecoderPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            DecoderPhase::Idle => write!(f, "Idle"),
            DecoderPhase::Training => write!(f, "Training"),
            DecoderPhase::Stretching => write!(f, "Stretching"),
        }
    }
}

/// A diagnostic event reconstructed from the telemetry stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "kebab-case"))]
pub enum Event {
    StartTraining,
    /// Training completed with the half-periods `low0`, `high0` and `low1`,
    /// in ticks
    FinishTraining {
        measurements: [u32; MEASUREMENT_COUNT],
    },
    StartStretching,
    /// Stretching ended. Also reported when training is aborted before it
    /// completed, as the device sends the same marker for both.
    FinishStretching,
    /// A byte that has no meaning in the current phase
    Unhandled { phase: DecoderPhase, byte: u8 },
}

impl Event {
    /// Natural period of the measured bus in ticks, `low0 + high0`
    pub fn period(&self) -> Option<u32> {
        match self {
            Event::FinishTraining {
                measurements: [low0, high0, ..],
            } => Some(low0.saturating_add(*high0)),
            _ => None,
        }
    }

    /// Frequency of the measured bus for a device ticking at `tick_rate_hz`
    ///
    /// Returns `None` for events other than
    /// [`FinishTraining`](`Self::FinishTraining`), or when no period was
    /// measured.
    pub fn bus_frequency(&self, tick_rate_hz: u32) -> Option<u32> {
        tick_rate_hz.checked_div(self.period()?)
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Event::StartTraining => write!(f, "start link training"),
            Event::FinishTraining {
                measurements: [low0, high0, low1],
            } => write!(
                f,
                "finish link training: low {low0}, high {high0}, low {low1} ticks"
            ),
            Event::StartStretching => write!(f, "start stretching"),
            Event::FinishStretching => write!(f, "finish stretching"),
            Event::Unhandled { phase, byte } => {
                write!(f, "unhandled data in {phase}: {byte:#04x}")
            }
        }
    }
}
