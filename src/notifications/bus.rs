//! EventBus implementation
//!
//! Direct-dispatch publish/subscribe transport. Publishing takes a snapshot of the
//! subscriber list and invokes every accepting subscriber in subscription order.
//! The snapshot holds weak references; a subscriber is only kept alive while its
//! own handler runs.
//! A failing or panicking subscriber is reported through the error handler and
//! delivery moves on to the next one.

use crate::notifications::error::NotificationError;
use crate::notifications::event::Event;
use crate::notifications::traits::Subscriber;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tokio::task::JoinHandle;

/// Callback receiving every delivery failure
pub type ErrorHandler = Arc<dyn Fn(&PublicationError) + Send + Sync>;

/// A single failed delivery, handed to the error handler
#[derive(Debug, Clone)]
pub struct PublicationError {
    pub subscriber_id: String,
    pub source: String,
    pub error: NotificationError,
}

/// Outcome of one publish call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryReport {
    /// Subscribers whose handler returned normally
    pub delivered: usize,
    /// Accepting subscribers skipped because they were being torn down
    pub skipped: usize,
    /// Subscribers whose handler failed or panicked
    pub failed: Vec<String>,
}

impl DeliveryReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct EventBus {
    subscribers: RwLock<Vec<Arc<dyn Subscriber>>>,
    error_handler: ErrorHandler,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_ids())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Bus whose error handler logs each failure
    pub fn new() -> Self {
        Self::with_error_handler(log_publication_error)
    }

    pub fn with_error_handler<H>(handler: H) -> Self
    where
        H: Fn(&PublicationError) + Send + Sync + 'static,
    {
        Self {
            subscribers: RwLock::new(Vec::new()),
            error_handler: Arc::new(handler),
        }
    }

    /// Register a subscriber. Returns false if its id is already subscribed.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if subscribers
            .iter()
            .any(|s| s.subscriber_id() == subscriber.subscriber_id())
        {
            log::warn!(
                "Subscriber '{}' is already subscribed (source: {})",
                subscriber.subscriber_id(),
                subscriber.source()
            );
            return false;
        }

        log::trace!(
            "Subscribed '{}' (source: {}, filter: {:?})",
            subscriber.subscriber_id(),
            subscriber.source(),
            subscriber.filter()
        );
        subscribers.push(subscriber);
        true
    }

    /// Remove a subscriber, returning it if it was present
    pub fn unsubscribe(&self, subscriber_id: &str) -> Option<Arc<dyn Subscriber>> {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let position = subscribers
            .iter()
            .position(|s| s.subscriber_id() == subscriber_id)?;
        log::trace!("Unsubscribed '{}'", subscriber_id);
        Some(subscribers.remove(position))
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn has_subscriber(&self, subscriber_id: &str) -> bool {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|s| s.subscriber_id() == subscriber_id)
    }

    pub fn subscriber_ids(&self) -> Vec<String> {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| s.subscriber_id().to_string())
            .collect()
    }

    /// (messages processed, errors) for a subscriber
    pub fn subscriber_statistics(&self, subscriber_id: &str) -> Option<(usize, usize)> {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|s| s.subscriber_id() == subscriber_id)
            .map(|s| {
                let stats = s.get_statistics();
                (stats.messages_processed(), stats.error_count())
            })
    }

    /// Deliver `event` to every accepting subscriber and wait for all of them
    pub async fn publish(&self, event: Event) -> DeliveryReport {
        let snapshot = self.snapshot();
        deliver(snapshot, self.error_handler.clone(), event).await
    }

    /// Deliver `event` on a separate tokio task; the caller does not wait.
    ///
    /// The subscriber snapshot is taken now, so subscribers added later do not see
    /// this event. Once spawned the delivery runs to completion.
    pub fn publish_async(
        &self,
        event: Event,
    ) -> Result<JoinHandle<DeliveryReport>, NotificationError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| NotificationError::NoRuntime)?;
        let snapshot = self.snapshot();
        let handler = self.error_handler.clone();
        Ok(runtime.spawn(deliver(snapshot, handler, event)))
    }

    /// Weak publishing handle for code that must not keep the bus alive
    pub fn publisher(self: &Arc<Self>) -> EventPublisher {
        EventPublisher {
            bus: Arc::downgrade(self),
        }
    }

    // Weak, so a queued delivery never keeps an unsubscribed subscriber alive
    fn snapshot(&self) -> Vec<Weak<dyn Subscriber>> {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(Arc::downgrade)
            .collect()
    }
}

async fn deliver(
    subscribers: Vec<Weak<dyn Subscriber>>,
    error_handler: ErrorHandler,
    event: Event,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    let event_kind = event.kind();

    for subscriber in subscribers {
        // Dropped since the snapshot was taken
        let Some(subscriber) = subscriber.upgrade() else {
            continue;
        };
        if !subscriber.filter().accepts(&event) {
            continue;
        }
        if !subscriber.is_live() {
            report.skipped += 1;
            continue;
        }

        let stats = subscriber.get_statistics();
        let outcome = AssertUnwindSafe(subscriber.handle_event(&event))
            .catch_unwind()
            .await;

        let error = match outcome {
            Ok(Ok(())) => {
                stats.record_message_processed();
                report.delivered += 1;
                continue;
            }
            Ok(Err(cause)) => NotificationError::HandlerFailed {
                subscriber_id: subscriber.subscriber_id().to_string(),
                event_kind,
                cause: cause.to_string(),
            },
            Err(panic) => NotificationError::SubscriberPanicked {
                subscriber_id: subscriber.subscriber_id().to_string(),
                event_kind,
                message: panic_message(panic.as_ref()),
            },
        };

        stats.record_message_processed();
        stats.record_error();
        report.failed.push(subscriber.subscriber_id().to_string());
        error_handler(&PublicationError {
            subscriber_id: subscriber.subscriber_id().to_string(),
            source: subscriber.source().to_string(),
            error,
        });
    }

    report
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn log_publication_error(failure: &PublicationError) {
    log::error!(
        "An error happened while handling an event (source: {}): {}",
        failure.source,
        failure.error
    );
}

/// Publishing handle that does not own the bus.
///
/// Given to plugins so they can emit events without creating a reference cycle
/// through their own subscription.
#[derive(Clone, Debug)]
pub struct EventPublisher {
    bus: Weak<EventBus>,
}

impl EventPublisher {
    /// A publisher that drops every event
    pub fn detached() -> Self {
        Self { bus: Weak::new() }
    }

    /// Publish synchronously; `None` if the bus is gone
    pub async fn publish(&self, event: Event) -> Option<DeliveryReport> {
        let bus = self.bus.upgrade()?;
        Some(bus.publish(event).await)
    }

    /// Publish on a separate task; `None` if the bus is gone
    pub fn publish_async(
        &self,
        event: Event,
    ) -> Option<Result<JoinHandle<DeliveryReport>, NotificationError>> {
        let bus = self.bus.upgrade()?;
        Some(bus.publish_async(event))
    }
}
