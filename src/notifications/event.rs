//! Event types for the notification system

use std::time::SystemTime;

use crate::plugin::types::PluginId;

#[derive(Clone, Debug, PartialEq)]
pub enum PluginEventType {
    Added,
    Removed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BundleEventType {
    Loaded,
    Unloaded,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SystemEventType {
    Startup,
    Shutdown,
}

/// A plugin instance entered or left the registry
#[derive(Clone, Debug)]
pub struct PluginEvent {
    pub event_type: PluginEventType,
    pub timestamp: SystemTime,
    pub plugin_id: PluginId,
    pub plugin_name: String,
    /// Owning bundle, `None` for standalone plugins
    pub bundle: Option<String>,
}

impl PluginEvent {
    pub fn new(
        event_type: PluginEventType,
        plugin_id: PluginId,
        plugin_name: String,
        bundle: Option<String>,
    ) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            plugin_id,
            plugin_name,
            bundle,
        }
    }
}

/// A bundle finished loading or was unloaded
#[derive(Clone, Debug)]
pub struct BundleEvent {
    pub event_type: BundleEventType,
    pub timestamp: SystemTime,
    pub bundle_name: String,
    pub plugin_count: usize,
}

impl BundleEvent {
    pub fn new(event_type: BundleEventType, bundle_name: String, plugin_count: usize) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            bundle_name,
            plugin_count,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SystemEvent {
    pub event_type: SystemEventType,
    pub timestamp: SystemTime,
    pub message: Option<String>,
}

impl SystemEvent {
    pub fn new(event_type: SystemEventType) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            message: None,
        }
    }

    pub fn with_message(event_type: SystemEventType, message: String) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            message: Some(message),
        }
    }
}

/// Application-defined event routed by topic
#[derive(Clone, Debug)]
pub struct HostEvent {
    pub topic: String,
    pub timestamp: SystemTime,
    pub payload: serde_json::Value,
}

impl HostEvent {
    pub fn new(topic: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            timestamp: SystemTime::now(),
            payload,
        }
    }
}

/// Unified event enum that encompasses all event types
#[derive(Clone, Debug)]
pub enum Event {
    Plugin(PluginEvent),
    Bundle(BundleEvent),
    System(SystemEvent),
    Host(HostEvent),
}

impl Event {
    /// Short name of the event family, used in logs and error reports
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Plugin(_) => "Plugin",
            Event::Bundle(_) => "Bundle",
            Event::System(_) => "System",
            Event::Host(_) => "Host",
        }
    }

    /// When the event was created
    pub fn timestamp(&self) -> SystemTime {
        match self {
            Event::Plugin(e) => e.timestamp,
            Event::Bundle(e) => e.timestamp,
            Event::System(e) => e.timestamp,
            Event::Host(e) => e.timestamp,
        }
    }
}

/// Event filtering options for subscribers
#[derive(Clone, Debug, PartialEq, Default)]
pub enum EventFilter {
    PluginOnly,
    BundleOnly,
    SystemOnly,
    HostOnly,
    /// Plugin and bundle lifecycle events
    Lifecycle,
    /// Host events with exactly this topic
    Topic(String),
    #[default]
    All,
}

impl EventFilter {
    /// Check if an event should be accepted by this filter
    pub fn accepts(&self, event: &Event) -> bool {
        match (self, event) {
            (EventFilter::Topic(topic), Event::Host(host)) => host.topic == *topic,
            _ => matches!(
                (self, event),
                (EventFilter::PluginOnly, Event::Plugin(_))
                    | (EventFilter::BundleOnly, Event::Bundle(_))
                    | (EventFilter::SystemOnly, Event::System(_))
                    | (EventFilter::HostOnly, Event::Host(_))
                    | (EventFilter::Lifecycle, Event::Plugin(_))
                    | (EventFilter::Lifecycle, Event::Bundle(_))
                    | (EventFilter::All, _)
            ),
        }
    }
}
