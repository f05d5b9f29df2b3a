//! Cross-session change notifications.
//!
//! One `BroadcastHub` is created at startup and shared through `AppState`. Each
//! registration gets its own bounded queue and worker task, so delivery to one listener
//! is FIFO and independent of every other listener. `publish` only enqueues; it never
//! waits for a listener to run.
//!
//! Messages are informational text (shown as a toast). Listeners re-read the stores
//! themselves when notified.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

type Listener = Arc<dyn Fn(&str) -> anyhow::Result<()> + Send + Sync>;

/// Token returned by `register`. Pass it to `unregister` to stop deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

impl Subscription {
    pub fn id(&self) -> u64 {
        self.0
    }
}

struct Registration {
    queue: mpsc::Sender<Arc<str>>,
    /// Cleared on unregister; the worker drops whatever is still queued.
    active: Arc<AtomicBool>,
}

impl Registration {
    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

pub struct BroadcastHub {
    subscribers: Mutex<HashMap<Subscription, Registration>>,
    next_id: AtomicU64,
    queue_capacity: usize,
    closed: AtomicBool,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl BroadcastHub {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            queue_capacity: queue_capacity.max(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Add a listener. Every call is a separate registration, even for the same closure.
    ///
    /// Spawns the subscriber's delivery worker, so it must be called from within a
    /// Tokio runtime. Listener errors and panics are logged and never reach the
    /// publisher or other listeners. After `shutdown` the returned subscription is
    /// inert: nothing is ever delivered to it.
    pub fn register<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&str) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let subscription = Subscription(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut subscribers = self.lock();
        if self.closed.load(Ordering::Acquire) {
            debug!("Broadcast hub is shut down, subscriber {} not registered", subscription.0);
            return subscription;
        }

        let (queue, deliveries) = mpsc::channel(self.queue_capacity);
        let active = Arc::new(AtomicBool::new(true));
        tokio::spawn(deliver(subscription, Arc::new(listener), deliveries, Arc::clone(&active)));
        subscribers.insert(subscription, Registration { queue, active });
        debug!(
            "Broadcast subscriber {} registered ({} active)",
            subscription.0,
            subscribers.len()
        );
        subscription
    }

    /// Remove one registration. Returns false if it was already gone. A delivery that
    /// is already running finishes; anything still queued is discarded.
    pub fn unregister(&self, subscription: Subscription) -> bool {
        let mut subscribers = self.lock();
        let removed = match subscribers.remove(&subscription) {
            Some(registration) => {
                registration.deactivate();
                true
            }
            None => false,
        };
        if removed {
            debug!(
                "Broadcast subscriber {} unregistered ({} active)",
                subscription.0,
                subscribers.len()
            );
        }
        removed
    }

    /// Queue `message` for every registered listener. Returns how many accepted it.
    pub fn publish(&self, message: impl Into<String>) -> usize {
        self.fan_out(message.into(), None)
    }

    /// Like `publish`, but skips `origin` (a session that already shows the change).
    pub fn publish_except(&self, origin: Subscription, message: impl Into<String>) -> usize {
        self.fan_out(message.into(), Some(origin))
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Drop every registration and refuse new ones. Running deliveries finish; queued
    /// ones are discarded.
    pub fn shutdown(&self) {
        let mut subscribers = self.lock();
        self.closed.store(true, Ordering::Release);
        let count = subscribers.len();
        for (_, registration) in subscribers.drain() {
            registration.deactivate();
        }
        info!("Broadcast hub shut down ({} subscribers released)", count);
    }

    fn fan_out(&self, message: String, skip: Option<Subscription>) -> usize {
        let message: Arc<str> = Arc::from(message);
        let subscribers = self.lock();
        let mut scheduled = 0;

        for (subscription, registration) in subscribers.iter() {
            if Some(*subscription) == skip {
                continue;
            }
            match registration.queue.try_send(Arc::clone(&message)) {
                Ok(()) => scheduled += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "Broadcast queue full for subscriber {}, dropping message",
                        subscription.0
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Broadcast worker for subscriber {} has stopped", subscription.0);
                }
            }
        }

        debug!("Broadcast \"{}\" scheduled for {} subscribers", message, scheduled);
        scheduled
    }

    // Nothing panics while holding the lock, but a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<Subscription, Registration>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn deliver(
    subscription: Subscription,
    listener: Listener,
    mut deliveries: mpsc::Receiver<Arc<str>>,
    active: Arc<AtomicBool>,
) {
    while let Some(message) = deliveries.recv().await {
        if !active.load(Ordering::Acquire) {
            debug!("Broadcast subscriber {} unregistered, discarding queued messages", subscription.0);
            break;
        }
        let listener = Arc::clone(&listener);
        // Listeners are plain closures and may block; keep them off the async workers.
        let outcome = tokio::task::spawn_blocking(move || listener(&*message)).await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Broadcast listener {} failed: {:?}", subscription.0, e),
            Err(e) => error!("Broadcast listener {} panicked: {}", subscription.0, e),
        }
    }
    debug!("Broadcast worker for subscriber {} stopped", subscription.0);
}
