//! Public API for the notification system
//!
//! External modules import from here rather than from the internal modules.

// Core event types and enums
pub use crate::notifications::event::{
    BundleEvent, BundleEventType, Event, EventFilter, HostEvent, PluginEvent, PluginEventType,
    SystemEvent, SystemEventType,
};

// Bus and publishing handles
pub use crate::notifications::bus::{
    DeliveryReport, ErrorHandler, EventBus, EventPublisher, PublicationError,
};
pub use crate::notifications::error::NotificationError;

// Traits and statistics
pub use crate::notifications::traits::{HandlerError, Subscriber, SubscriberStatistics};
