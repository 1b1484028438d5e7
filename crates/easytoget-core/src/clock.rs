use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of time for debouncing, expiry and synthesized timestamps.
///
/// Injected everywhere time matters so tests can step it by hand.
pub trait Clock: Send + Sync {
    /// Monotonic time, for deadlines
    fn now(&self) -> Instant;

    /// Wall-clock time, for anything shown to the user or sent to the server
    fn wall_now(&self) -> DateTime<Utc>;
}

/// The real clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Debug)]
struct ManualState {
    base_instant: Instant,
    base_wall: DateTime<Utc>,
    elapsed: Duration,
}

impl ManualClock {
    /// Start at the current real time
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Start with the wall clock reading `wall`
    pub fn starting_at(wall: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualState {
                base_instant: Instant::now(),
                base_wall: wall,
                elapsed: Duration::ZERO,
            })),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut state = self.lock();
        state.elapsed += by;
    }

    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        // A poisoned clock still holds a valid reading
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let state = self.lock();
        state.base_instant + state.elapsed
    }

    fn wall_now(&self) -> DateTime<Utc> {
        let state = self.lock();
        let elapsed = chrono::Duration::from_std(state.elapsed).unwrap_or(chrono::Duration::zero());
        state.base_wall + elapsed
    }
}
