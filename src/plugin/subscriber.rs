//! Adapter subscribing a plugin instance to the event bus

use crate::notifications::api::{Event, EventFilter, HandlerError, Subscriber, SubscriberStatistics};
use crate::plugin::traits::Plugin;
use crate::plugin::types::PluginId;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Bus subscription of one registered plugin
pub(crate) struct PluginSubscriber {
    subscriber_id: String,
    plugin_name: String,
    plugin: Arc<dyn Plugin>,
    filter: EventFilter,
    live: AtomicBool,
    stats: SubscriberStatistics,
}

impl PluginSubscriber {
    pub(crate) fn new(id: PluginId, plugin: Arc<dyn Plugin>) -> Self {
        Self {
            subscriber_id: id.to_string(),
            plugin_name: plugin.plugin_name().to_string(),
            filter: plugin.event_filter(),
            plugin,
            live: AtomicBool::new(true),
            stats: SubscriberStatistics::new(),
        }
    }

    pub(crate) fn plugin(&self) -> &Arc<dyn Plugin> {
        &self.plugin
    }

    pub(crate) fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// Stop deliveries; dispatch already in progress skips this subscriber from now on
    pub(crate) fn retire(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Subscriber for PluginSubscriber {
    async fn handle_event(&self, event: &Event) -> Result<(), HandlerError> {
        self.plugin.handle_event(event).await.map_err(Into::into)
    }

    fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    fn source(&self) -> &str {
        &self.plugin_name
    }

    fn filter(&self) -> &EventFilter {
        &self.filter
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn get_statistics(&self) -> &SubscriberStatistics {
        &self.stats
    }
}
