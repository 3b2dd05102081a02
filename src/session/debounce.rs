use std::time::Duration;

use tokio::time::Instant;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

pub trait Clock {
    fn now(&self) -> Instant;
}

/// Runtime clock. Honors `tokio::time::pause` in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Trailing-edge debouncer: only the last scheduled value is delivered, once
/// `delay` elapsed without a newer one.
#[derive(Debug)]
pub struct Debouncer<T, C = TokioClock> {
    delay: Duration,
    clock: C,
    pending: Option<(Instant, T)>,
}

impl<T, C: Clock> Debouncer<T, C> {
    pub fn new(delay: Duration, clock: C) -> Self {
        Debouncer {
            delay,
            clock,
            pending: None,
        }
    }

    /// Replaces any pending value and restarts the timer.
    pub fn schedule(&mut self, value: T) {
        self.pending = Some((self.clock.now() + self.delay, value));
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Returns the pending value if its deadline has passed.
    pub fn poll(&mut self) -> Option<T> {
        let due = matches!(&self.pending, Some((deadline, _)) if *deadline <= self.clock.now());
        match due {
            true => self.cancel(),
            false => None,
        }
    }
}
