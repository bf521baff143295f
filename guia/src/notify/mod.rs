//! Synchronous fan-out notification.
//!
//! A [`NotificationHub`] delivers each published event to every registered
//! [`Subscriber`], one after another, in subscription order.
//!
//! # Ownership
//!
//! The hub keeps only [`Weak`] references. Subscribers are owned by whoever
//! created them; once the last `Arc` is dropped the subscriber silently stops
//! receiving events and is pruned on the next publish.
//!
//! # Failure isolation
//!
//! A subscriber that returns an error or panics is logged and skipped; the
//! remaining subscribers still receive the event.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use guia::notify::{NotificationHub, Subscriber, SubscriberError};
//!
//! struct Printer;
//!
//! impl Subscriber<String> for Printer {
//!     fn update(&self, event: &String) -> Result<(), SubscriberError> {
//!         println!("{}", event);
//!         Ok(())
//!     }
//! }
//!
//! let hub = NotificationHub::new("messages");
//! let printer = Arc::new(Printer);
//! hub.subscribe(&printer);
//!
//! let report = hub.publish(&"hello".to_string());
//! assert_eq!(report.delivered, 1);
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{trace, warn};

/// Error returned by a subscriber that could not handle an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SubscriberError(pub String);

impl SubscriberError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<std::io::Error> for SubscriberError {
    fn from(e: std::io::Error) -> Self {
        Self(e.to_string())
    }
}

/// A sink that receives events from a [`NotificationHub`].
pub trait Subscriber<E>: Send + Sync {
    /// Handles one event.
    fn update(&self, event: &E) -> Result<(), SubscriberError>;

    /// Name used in log messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Outcome of a single [`NotificationHub::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers that handled the event successfully.
    pub delivered: usize,
    /// Subscribers that returned an error or panicked.
    pub failed: usize,
}

/// Multi-subscriber fan-out for events of type `E`.
pub struct NotificationHub<E> {
    name: &'static str,
    subscribers: Mutex<Vec<Weak<dyn Subscriber<E>>>>,
}

impl<E: 'static> NotificationHub<E> {
    /// Creates an empty hub. `name` identifies the hub in logs.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a subscriber.
    ///
    /// The hub does not deduplicate: subscribing the same sink twice delivers
    /// each event to it twice.
    pub fn subscribe<S>(&self, sink: &Arc<S>)
    where
        S: Subscriber<E> + 'static,
    {
        let weak: Weak<dyn Subscriber<E>> = Arc::downgrade(sink) as Weak<dyn Subscriber<E>>;
        let mut subscribers = self.subscribers.lock();
        subscribers.push(weak);
        trace!(hub = self.name, count = subscribers.len(), "Subscriber added");
    }

    /// Removes every registration of `sink`. No-op if it was never subscribed.
    pub fn unsubscribe<S>(&self, sink: &Arc<S>)
    where
        S: Subscriber<E> + 'static,
    {
        let target = Arc::as_ptr(sink) as *const ();
        self.subscribers
            .lock()
            .retain(|weak| weak.as_ptr() as *const () != target);
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Delivers `event` to every live subscriber in subscription order.
    ///
    /// The subscriber list is snapshotted before delivery, so subscribers may
    /// subscribe or unsubscribe from within `update` without deadlocking;
    /// such changes take effect from the next publish.
    pub fn publish(&self, event: &E) -> PublishReport {
        let snapshot: Vec<Arc<dyn Subscriber<E>>> = {
            let mut subscribers = self.subscribers.lock();
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        let mut report = PublishReport::default();
        for subscriber in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber.update(event)));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(
                        hub = self.name,
                        subscriber = subscriber.name(),
                        error = %e,
                        "Subscriber failed to handle event"
                    );
                }
                Err(payload) => {
                    report.failed += 1;
                    warn!(
                        hub = self.name,
                        subscriber = subscriber.name(),
                        panic = panic_message(payload.as_ref()),
                        "Subscriber panicked while handling event"
                    );
                }
            }
        }

        trace!(
            hub = self.name,
            delivered = report.delivered,
            failed = report.failed,
            "Event published"
        );
        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
