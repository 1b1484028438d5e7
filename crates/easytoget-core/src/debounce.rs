use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::Clock;

/// A value that settles only after it stops changing for `delay`.
///
/// `set` records the latest value and re-arms the deadline; `poll` hands the
/// value out once the deadline passes, and only if it differs from the last
/// value handed out.
pub struct Debounced<T> {
    clock: Arc<dyn Clock>,
    delay: Duration,
    settled: T,
    pending: Option<(T, Instant)>,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(initial: T, delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            delay,
            settled: initial,
            pending: None,
        }
    }

    pub fn set(&mut self, value: T) {
        let deadline = self.clock.now() + self.delay;
        self.pending = Some((value, deadline));
    }

    /// Settle the pending value if its quiet period is over
    pub fn poll(&mut self) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if self.clock.now() >= *deadline => self.settle(),
            _ => None,
        }
    }

    /// Settle the pending value now, skipping the rest of the quiet period
    pub fn flush(&mut self) -> Option<T> {
        if self.pending.is_some() {
            self.settle()
        } else {
            None
        }
    }

    fn settle(&mut self) -> Option<T> {
        let (value, _) = self.pending.take()?;
        if value == self.settled {
            return None;
        }
        self.settled = value.clone();
        Some(value)
    }

    /// The last value that settled
    pub fn settled(&self) -> &T {
        &self.settled
    }

    /// When the pending value will settle, if one is waiting
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }
}
