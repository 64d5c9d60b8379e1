//! Plugin Context
//!
//! Runtime information handed to a plugin in `on_create`.

use crate::notifications::api::{Event, EventPublisher, HostEvent};
use crate::plugin::types::PluginId;

/// Context provided to a plugin when it is created
#[derive(Debug, Clone)]
pub struct PluginContext {
    plugin_id: PluginId,
    bundle: Option<String>,
    publisher: EventPublisher,
}

impl PluginContext {
    pub(crate) fn new(
        plugin_id: PluginId,
        bundle: Option<String>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            plugin_id,
            bundle,
            publisher,
        }
    }

    /// A context with no bus behind it; events published through it are dropped
    pub fn detached() -> Self {
        Self::new(PluginId::new(0), None, EventPublisher::detached())
    }

    /// Id the plugin will be registered under
    pub fn plugin_id(&self) -> PluginId {
        self.plugin_id
    }

    /// Owning bundle, `None` for standalone plugins
    pub fn bundle(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    /// Handle for publishing events; plugins may keep a clone of it
    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Publish a host event on a background task.
    ///
    /// Returns false if the bus is gone or no runtime is available.
    pub fn emit(&self, topic: impl Into<String>, payload: serde_json::Value) -> bool {
        matches!(
            self.publisher
                .publish_async(Event::Host(HostEvent::new(topic, payload))),
            Some(Ok(_))
        )
    }
}
