use core::fmt::{Display, Formatter};

/// State of the observer/replicator.
///
/// The core never terminates. Once trained it keeps stretching every bus
/// cycle until a trigger press aborts it back to [`Idle`](`Self::Idle`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeviceState {
    #[default]
    Idle,
    /// Waiting for the first falling edge of a training run
    TrainWait,
    /// Counting the current half-period
    TrainCount,
    /// Trained; waiting for the next falling edge to stretch
    StretchWait,
    /// Holding the line low
    Holding,
    /// Hold elapsed; waiting for the line to read high again
    HoldingDone,
    /// Cancelling; reports the end of the run and returns to idle
    Abort,
}

impl DeviceState {
    /// Whether the core is doing anything other than waiting for a trigger
    pub fn is_active(&self) -> bool {
        !matches!(self, DeviceState::Idle)
    }

    /// Whether the core is in the training phase
    pub fn is_training(&self) -> bool {
        matches!(self, DeviceState::TrainWait | DeviceState::TrainCount)
    }
}

impl Display for DeviceState {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            DeviceState::Idle => write!(f, "Idle"),
            DeviceState::TrainWait => write!(f, "Train: wait"),
            DeviceState::TrainCount => write!(f, "Train: count"),
            DeviceState::StretchWait => write!(f, "Stretch: wait"),
            DeviceState::Holding => write!(f, "Stretch: hold"),
            DeviceState::HoldingDone => write!(f, "Stretch: finished hold"),
            DeviceState::Abort => write!(f, "Abort"),
        }
    }
}
