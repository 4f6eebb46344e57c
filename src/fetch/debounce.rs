use instant::Instant;
use std::time::Duration;

/// Trailing-edge debounce over explicit time.
///
/// Each `trigger` replaces the pending value and pushes the deadline to
/// `now + delay`; `poll` releases the value once the deadline has passed.
/// Nothing here sleeps: the caller decides when to poll, typically at
/// [`deadline`](Self::deadline).
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `value`, superseding anything pending
    pub fn trigger(&mut self, value: T, now: Instant) {
        self.pending = Some((now + self.delay, value));
    }

    /// Takes the pending value if its quiet period is over
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, value)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops the pending value without releasing it
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }
}
