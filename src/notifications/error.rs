//! Error types for the notification system

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NotificationError {
    #[error("Asynchronous publish requires a running tokio runtime")]
    NoRuntime,

    #[error("Subscriber '{subscriber_id}' failed to handle {event_kind} event: {cause}")]
    HandlerFailed {
        subscriber_id: String,
        event_kind: &'static str,
        cause: String,
    },

    #[error("Subscriber '{subscriber_id}' panicked while handling {event_kind} event: {message}")]
    SubscriberPanicked {
        subscriber_id: String,
        event_kind: &'static str,
        message: String,
    },
}

impl NotificationError {
    /// Identifier of the subscriber the error belongs to, if any
    pub fn subscriber_id(&self) -> Option<&str> {
        match self {
            NotificationError::NoRuntime => None,
            NotificationError::HandlerFailed { subscriber_id, .. }
            | NotificationError::SubscriberPanicked { subscriber_id, .. } => Some(subscriber_id),
        }
    }
}

impl crate::core::error_handling::ContextualError for NotificationError {
    fn is_user_actionable(&self) -> bool {
        false // All notification errors are system-level
    }

    fn user_message(&self) -> Option<String> {
        None
    }
}
