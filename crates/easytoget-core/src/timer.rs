// Deferred callbacks, real and simulated
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::clock::{Clock, ManualClock};

pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs a task once after a delay. Fire-and-forget: there is no handle to cancel it.
pub trait Timer: Send + Sync {
    fn schedule(&self, after: Duration, task: TimerTask);
}

/// Timer backed by the tokio runtime
#[derive(Debug, Clone)]
pub struct TokioTimer {
    handle: tokio::runtime::Handle,
}

impl TokioTimer {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Timer on the runtime the caller is running in
    pub fn current() -> crate::Result<Self> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| crate::Error::Runtime(e.to_string()))
    }
}

impl Timer for TokioTimer {
    fn schedule(&self, after: Duration, task: TimerTask) {
        self.handle.spawn(async move {
            tokio::time::sleep(after).await;
            task();
        });
    }
}

struct Pending {
    due: Instant,
    seq: u64,
    task: TimerTask,
}

/// Timer that fires only when [`ManualTimer::advance`] moves its clock past a deadline.
///
/// Tasks due at the same instant fire in scheduling order.
#[derive(Clone)]
pub struct ManualTimer {
    clock: ManualClock,
    queue: Arc<Mutex<Vec<Pending>>>,
    seq: Arc<AtomicU64>,
}

impl ManualTimer {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            queue: Arc::new(Mutex::new(Vec::new())),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Number of tasks still waiting to fire
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Move time forward by `by`, running every task that comes due on the way
    pub fn advance(&self, by: Duration) {
        let target = self.clock.now() + by;

        while let Some(pending) = self.pop_due(target) {
            let now = self.clock.now();
            if pending.due > now {
                self.clock.advance(pending.due - now);
            }
            (pending.task)();
        }

        let now = self.clock.now();
        if target > now {
            self.clock.advance(target - now);
        }
    }

    fn pop_due(&self, target: Instant) -> Option<Pending> {
        let mut queue = self.lock();
        let index = queue
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= target)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;
        Some(queue.remove(index))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Pending>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Timer for ManualTimer {
    fn schedule(&self, after: Duration, task: TimerTask) {
        let pending = Pending {
            due: self.clock.now() + after,
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
            task,
        };
        self.lock().push(pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_timer_fires_in_deadline_order() {
        let timer = ManualTimer::new(ManualClock::new());
        let fired = Arc::new(Mutex::new(Vec::new()));

        for (label, ms) in [("late", 300u64), ("early", 100), ("middle", 200)] {
            let fired = fired.clone();
            timer.schedule(
                Duration::from_millis(ms),
                Box::new(move || fired.lock().unwrap().push(label)),
            );
        }

        timer.advance(Duration::from_millis(150));
        assert_eq!(*fired.lock().unwrap(), vec!["early"]);
        assert_eq!(timer.pending(), 2);

        timer.advance(Duration::from_millis(500));
        assert_eq!(*fired.lock().unwrap(), vec!["early", "middle", "late"]);
        assert_eq!(timer.pending(), 0);
        assert_eq!(timer.clock().elapsed(), Duration::from_millis(650));
    }

    #[test]
    fn test_manual_timer_runs_tasks_scheduled_while_advancing() {
        let timer = ManualTimer::new(ManualClock::new());
        let count = Arc::new(AtomicU64::new(0));

        let inner_timer = timer.clone();
        let inner_count = count.clone();
        timer.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                inner_count.fetch_add(1, Ordering::SeqCst);
                let again = inner_count.clone();
                inner_timer.schedule(
                    Duration::from_millis(10),
                    Box::new(move || {
                        again.fetch_add(1, Ordering::SeqCst);
                    }),
                );
            }),
        );

        timer.advance(Duration::from_millis(25));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_timer_fires_after_delay() {
        let timer = TokioTimer::current().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();

        timer.schedule(
            Duration::from_secs(5),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );

        tokio::time::timeout(Duration::from_secs(6), rx)
            .await
            .expect("timer should fire before the timeout")
            .unwrap();
    }
}
