use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tracing::debug;

use crate::clock::Clock;
use crate::timer::Timer;

/// How long a toast stays up unless told otherwise
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Info => write!(f, "Info"),
            NotificationKind::Success => write!(f, "Success"),
            NotificationKind::Warning => write!(f, "Warning"),
            NotificationKind::Error => write!(f, "Error"),
        }
    }
}

/// A transient message. Never mutated after creation, only removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
    /// Zero means it stays until dismissed
    pub duration: Duration,
}

type Listener = Arc<dyn Fn(&[Notification]) + Send + Sync>;

// A snapshot bound for the listeners registered when it was taken
struct Delivery {
    snapshot: Vec<Notification>,
    listeners: Vec<Listener>,
}

struct Registry {
    next_id: u64,
    next_listener_id: u64,
    notifications: Vec<Notification>,
    listeners: Vec<(u64, Listener)>,
    outbox: VecDeque<Delivery>,
    // Set while some call is draining the outbox
    delivering: bool,
}

struct HubInner {
    registry: Mutex<Registry>,
    clock: Arc<dyn Clock>,
    timer: Arc<dyn Timer>,
    default_duration: Duration,
}

impl HubInner {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn dismiss(&self, id: u64) -> bool {
        let mut registry = self.lock();
        let before = registry.notifications.len();
        registry.notifications.retain(|n| n.id != id);
        if registry.notifications.len() == before {
            return false;
        }

        debug!("Dismissed notification {}", id);
        self.announce(registry);
        true
    }

    /// Queue the current list for every listener, then drain the queue unless
    /// another call is already doing so.
    ///
    /// Snapshots are queued under the same lock as the change that produced
    /// them, and only one caller drains at a time, so listeners see changes in
    /// the order they were made. Listeners run with the lock released; a
    /// publish or dismiss made from inside a listener, or from another thread
    /// mid-drain, queues its snapshot and returns, and the draining call
    /// delivers it next.
    fn announce(&self, mut registry: MutexGuard<'_, Registry>) {
        let delivery = Delivery {
            snapshot: registry.notifications.clone(),
            listeners: registry.listeners.iter().map(|(_, l)| l.clone()).collect(),
        };
        registry.outbox.push_back(delivery);
        if registry.delivering {
            return;
        }
        registry.delivering = true;
        drop(registry);

        let _drain = DrainGuard(self);
        loop {
            let next = {
                let mut registry = self.lock();
                match registry.outbox.pop_front() {
                    Some(next) => next,
                    None => {
                        registry.delivering = false;
                        return;
                    }
                }
            };
            for listener in &next.listeners {
                listener(&next.snapshot);
            }
        }
    }
}

// Hands draining back if a listener panics mid-delivery
struct DrainGuard<'a>(&'a HubInner);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().delivering = false;
        }
    }
}

/// Registry of active toasts with subscribe/publish and auto-expiry.
///
/// One instance is created at startup and handed to whatever needs it; clones
/// share the same registry. Ids increase monotonically and are never reused.
/// Subscribers get the full ordered list after every change, in the order the
/// changes were made. With no other call delivering, that happens before
/// `publish`/`dismiss` return.
#[derive(Clone)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl NotificationHub {
    pub fn new(clock: Arc<dyn Clock>, timer: Arc<dyn Timer>) -> Self {
        Self::with_default_duration(clock, timer, DEFAULT_NOTIFICATION_DURATION)
    }

    pub fn with_default_duration(
        clock: Arc<dyn Clock>,
        timer: Arc<dyn Timer>,
        default_duration: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(HubInner {
                registry: Mutex::new(Registry {
                    next_id: 1,
                    next_listener_id: 1,
                    notifications: Vec::new(),
                    listeners: Vec::new(),
                    outbox: VecDeque::new(),
                    delivering: false,
                }),
                clock,
                timer,
                default_duration,
            }),
        }
    }

    /// Publish with the hub's default duration
    pub fn notify(&self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        self.publish(message, kind, self.inner.default_duration)
    }

    /// Add a notification and return its id.
    ///
    /// A non-zero `duration` schedules an automatic dismiss; it cannot be
    /// cancelled, but dismissing early makes the later expiry a no-op.
    pub fn publish(
        &self,
        message: impl Into<String>,
        kind: NotificationKind,
        duration: Duration,
    ) -> u64 {
        let message = message.into();
        let created_at = self.inner.clock.wall_now();

        let mut registry = self.inner.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.notifications.push(Notification {
            id,
            message,
            kind,
            created_at,
            duration,
        });

        debug!("Published {} notification {} ({:?})", kind, id, duration);
        self.inner.announce(registry);

        if !duration.is_zero() {
            let hub: Weak<HubInner> = Arc::downgrade(&self.inner);
            self.inner.timer.schedule(
                duration,
                Box::new(move || {
                    if let Some(hub) = hub.upgrade() {
                        hub.dismiss(id);
                    }
                }),
            );
        }

        id
    }

    /// Remove a notification. Returns false, without notifying anyone, if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        self.inner.dismiss(id)
    }

    /// Register a listener for every change to the registry
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[Notification]) + Send + Sync + 'static,
    {
        let mut registry = self.inner.lock();
        let id = registry.next_listener_id;
        registry.next_listener_id += 1;
        registry.listeners.push((id, Arc::new(listener)));

        Subscription {
            hub: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Current notifications in insertion order
    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner.lock().notifications.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

/// Handle returned by [`NotificationHub::subscribe`]
pub struct Subscription {
    hub: Weak<HubInner>,
    id: u64,
}

impl Subscription {
    /// Stop receiving snapshots
    pub fn unsubscribe(self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.lock().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::timer::ManualTimer;

    fn hub() -> (NotificationHub, ManualTimer) {
        let clock = ManualClock::new();
        let timer = ManualTimer::new(clock.clone());
        let hub = NotificationHub::new(Arc::new(clock), Arc::new(timer.clone()));
        (hub, timer)
    }

    #[test]
    fn test_ids_are_monotonic() {
        let (hub, _timer) = hub();
        let a = hub.publish("a", NotificationKind::Info, Duration::ZERO);
        let b = hub.publish("b", NotificationKind::Info, Duration::ZERO);
        hub.dismiss(b);
        let c = hub.publish("c", NotificationKind::Info, Duration::ZERO);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_zero_duration_never_expires() {
        let (hub, timer) = hub();
        hub.publish("sticky", NotificationKind::Info, Duration::ZERO);
        assert_eq!(timer.pending(), 0);

        timer.advance(Duration::from_secs(3600));
        assert_eq!(hub.len(), 1);
    }

    #[test]
    fn test_timed_notification_expires() {
        let (hub, timer) = hub();
        let id = hub.publish("brief", NotificationKind::Info, Duration::from_millis(100));

        timer.advance(Duration::from_millis(99));
        assert_eq!(hub.snapshot()[0].id, id);

        timer.advance(Duration::from_millis(51));
        assert!(hub.is_empty());
    }

    #[test]
    fn test_default_duration_applies() {
        let (hub, timer) = hub();
        hub.notify("default", NotificationKind::Success);

        timer.advance(Duration::from_millis(4999));
        assert_eq!(hub.len(), 1);
        timer.advance(Duration::from_millis(1));
        assert!(hub.is_empty());
    }

    #[test]
    fn test_dismiss_preserves_order_of_survivors() {
        let (hub, _timer) = hub();
        let ids: Vec<u64> = ["one", "two", "three"]
            .iter()
            .map(|m| hub.publish(*m, NotificationKind::Info, Duration::ZERO))
            .collect();

        assert!(hub.dismiss(ids[1]));
        let messages: Vec<String> = hub.snapshot().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["one", "three"]);
    }

    #[test]
    fn test_double_dismiss_is_a_silent_noop() {
        let (hub, _timer) = hub();
        let calls = Arc::new(Mutex::new(0usize));
        let counter = calls.clone();
        let _sub = hub.subscribe(move |_| *counter.lock().unwrap() += 1);

        let id = hub.publish("x", NotificationKind::Warning, Duration::ZERO);
        assert!(hub.dismiss(id));
        assert!(!hub.dismiss(id));

        // publish + first dismiss only
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_manual_dismiss_racing_expiry_is_harmless() {
        let (hub, timer) = hub();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let _sub = hub.subscribe(move |list| log.lock().unwrap().push(list.len()));

        let id = hub.publish("race", NotificationKind::Error, Duration::from_millis(100));
        hub.dismiss(id);
        timer.advance(Duration::from_millis(200));

        assert_eq!(*seen.lock().unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_subscribers_get_full_snapshots_until_unsubscribed() {
        let (hub, _timer) = hub();
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));

        let log = first.clone();
        let sub_a = hub.subscribe(move |list| {
            log.lock()
                .unwrap()
                .push(list.iter().map(|n| n.id).collect::<Vec<_>>())
        });
        let log = second.clone();
        let _sub_b = hub.subscribe(move |list| log.lock().unwrap().push(list.len()));
        assert_eq!(hub.subscriber_count(), 2);

        let a = hub.publish("a", NotificationKind::Info, Duration::ZERO);
        let b = hub.publish("b", NotificationKind::Info, Duration::ZERO);
        sub_a.unsubscribe();
        hub.dismiss(a);

        assert_eq!(*first.lock().unwrap(), vec![vec![a], vec![a, b]]);
        assert_eq!(*second.lock().unwrap(), vec![1, 2, 1]);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn test_listener_may_publish_reentrantly() {
        let (hub, _timer) = hub();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner = hub.clone();
        let log = seen.clone();
        let sub = hub.subscribe(move |list| {
            log.lock().unwrap().push(list.len());
            if list.iter().any(|n| n.kind == NotificationKind::Error) && list.len() == 1 {
                inner.publish("follow-up", NotificationKind::Info, Duration::ZERO);
            }
        });

        hub.publish("boom", NotificationKind::Error, Duration::ZERO);
        assert_eq!(hub.len(), 2);
        // The nested publish is delivered after the outer one, not inside it
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);

        // The listener owns a hub clone; unsubscribing breaks the cycle
        sub.unsubscribe();
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_nested_dismiss_arrives_after_enclosing_publish() {
        let (hub, _timer) = hub();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&hub.inner);
        let log = seen.clone();
        let _sub = hub.subscribe(move |list| {
            log.lock()
                .unwrap()
                .push(list.iter().map(|n| n.id).collect::<Vec<_>>());
            if list.len() == 2 {
                if let Some(inner) = weak.upgrade() {
                    inner.dismiss(list[0].id);
                }
            }
        });

        let a = hub.publish("a", NotificationKind::Info, Duration::ZERO);
        let b = hub.publish("b", NotificationKind::Info, Duration::ZERO);

        assert_eq!(*seen.lock().unwrap(), vec![vec![a], vec![a, b], vec![b]]);
        assert_eq!(hub.snapshot()[0].id, b);
    }

    #[test]
    fn test_panicking_listener_does_not_wedge_delivery() {
        let (hub, _timer) = hub();
        let calls = Arc::new(Mutex::new(0usize));

        let sub = hub.subscribe(|list| {
            if list.iter().any(|n| n.message == "poison") {
                panic!("listener failure");
            }
        });
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            hub.publish("poison", NotificationKind::Error, Duration::ZERO);
        }));
        assert!(result.is_err());
        sub.unsubscribe();

        let counter = calls.clone();
        let _sub = hub.subscribe(move |_| *counter.lock().unwrap() += 1);
        hub.publish("fine", NotificationKind::Info, Duration::ZERO);
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
