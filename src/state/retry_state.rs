/// Transient-failure bookkeeping for one logical unit of work
///
/// Created when a unit starts, discarded once it succeeds or the limit is
/// exceeded. Never shared between concurrent units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    attempts: u32,
    limit: u32,
}

impl RetryState {
    pub fn new(limit: u32) -> Self {
        Self { attempts: 0, limit }
    }

    /// Records one transient failure and reports whether the unit must be abandoned
    pub fn record_failure(&mut self) -> bool {
        self.attempts += 1;
        self.is_exhausted()
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts > self.limit
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
