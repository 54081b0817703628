/// A resettable tick counter that saturates at a configured maximum.
///
/// Used to time the half-periods of the observed line and the length of a
/// hold. The count never wraps; ticks past `max` are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TickCounter {
    count: u32,
    max: u32,
}

impl TickCounter {
    pub(crate) const fn new(max: u32) -> Self {
        Self { count: 0, max }
    }

    pub(crate) fn reset(&mut self) {
        self.count = 0;
    }

    pub(crate) fn tick(&mut self) {
        if self.count < self.max {
            self.count += 1;
        }
    }

    pub(crate) fn value(&self) -> u32 {
        self.count
    }

    pub(crate) fn is_saturated(&self) -> bool {
        self.count >= self.max
    }
}
