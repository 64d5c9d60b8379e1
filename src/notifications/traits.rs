//! Traits for the notification system

use crate::notifications::event::{Event, EventFilter};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Instant;

/// Error type returned by subscriber callbacks
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Statistics tracking for a subscriber
#[derive(Debug)]
pub struct SubscriberStatistics {
    messages_processed: AtomicUsize,
    error_count: AtomicUsize,
    last_message_time: RwLock<Option<Instant>>,
    last_error_time: RwLock<Option<Instant>>,
}

impl Default for SubscriberStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriberStatistics {
    pub fn new() -> Self {
        Self {
            messages_processed: AtomicUsize::new(0),
            error_count: AtomicUsize::new(0),
            last_message_time: RwLock::new(None),
            last_error_time: RwLock::new(None),
        }
    }

    pub fn messages_processed(&self) -> usize {
        self.messages_processed.load(Ordering::Relaxed)
    }

    pub fn record_message_processed(&self) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut time) = self.last_message_time.write() {
            *time = Some(Instant::now());
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut time) = self.last_error_time.write() {
            *time = Some(Instant::now());
        }
    }

    pub fn last_message_time(&self) -> Option<Instant> {
        *self.last_message_time.read().ok()?
    }

    pub fn last_error_time(&self) -> Option<Instant> {
        *self.last_error_time.read().ok()?
    }
}

/// Trait for event subscribers
///
/// The bus invokes `handle_event` for every published event accepted by
/// `filter()`. Errors and panics are reported to the bus error handler and never
/// reach the publisher.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Handle an incoming event
    async fn handle_event(&self, event: &Event) -> Result<(), HandlerError>;

    /// Get the unique identifier for this subscriber
    fn subscriber_id(&self) -> &str;

    /// Get the source identifier for debugging
    fn source(&self) -> &str;

    /// Events this subscriber wants
    fn filter(&self) -> &EventFilter;

    /// False once the subscriber is being torn down; dispatch skips it from then on
    fn is_live(&self) -> bool {
        true
    }

    /// Get statistics for this subscriber
    fn get_statistics(&self) -> &SubscriberStatistics;
}
