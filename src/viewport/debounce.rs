//! Cancellable debounce timer driven by explicit timestamps.
//!
//! The canvas runs on a single event loop, so instead of owning an OS or
//! browser timer the debouncer stores a deadline and is polled on every
//! frame. Dropping it, or calling [`Debouncer::cancel`], discards the
//! pending value: nothing can fire after teardown.

use std::time::Duration;
use web_time::Instant;

#[derive(Debug)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

/// Holds the latest value until input has been quiet for `delay`.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending value and restart the quiet period.
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + self.delay,
        });
    }

    /// Take the pending value if its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(p) if now >= p.deadline => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Drop the pending value without publishing it.
    pub fn cancel(&mut self) -> bool {
        let had_pending = self.pending.is_some();
        self.pending = None;
        if had_pending {
            log::trace!("Debounce: pending value cancelled");
        }
        had_pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
