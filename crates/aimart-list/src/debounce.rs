//! Quiet-period debouncing for search input

use std::time::{Duration, Instant};

/// Holds the latest value until no new value has arrived for `delay`
#[derive(Debug, Clone)]
pub struct Debouncer<V> {
    delay: Duration,
    pending: Option<(V, Instant)>,
}

impl<V> Debouncer<V> {
    /// Debouncer with the given quiet period
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record a new value, restarting the quiet period
    pub fn push(&mut self, value: V, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Release the pending value once its quiet period is over
    pub fn poll(&mut self, now: Instant) -> Option<V> {
        let ready = matches!(&self.pending, Some((_, deadline)) if now >= *deadline);
        if ready { self.flush() } else { None }
    }

    /// Release the pending value immediately (e.g. the user pressed Enter)
    pub fn flush(&mut self) -> Option<V> {
        self.pending.take().map(|(v, _)| v)
    }

    /// Time left before the pending value is released
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(_, deadline)| deadline.saturating_duration_since(now))
    }

    /// Whether a value is waiting
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Configured quiet period
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}
