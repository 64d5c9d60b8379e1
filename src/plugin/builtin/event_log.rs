//! Event log plugin
//!
//! Writes every event it receives to the log at debug level and keeps a count.
//! Useful when running the host to see what bundles publish.

use crate::builtin_plugin;
use crate::notifications::api::Event;
use crate::plugin::context::PluginContext;
use crate::plugin::error::PluginResult;
use crate::plugin::traits::Plugin;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};

builtin_plugin!(EventLogPlugin);

#[derive(Debug, Default)]
pub struct EventLogPlugin {
    seen: AtomicUsize,
}

impl EventLogPlugin {
    pub const NAME: &'static str = "event-log";

    /// Number of events handled so far
    pub fn events_seen(&self) -> usize {
        self.seen.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl Plugin for EventLogPlugin {
    fn plugin_name(&self) -> &str {
        Self::NAME
    }

    async fn on_create(&self, context: &PluginContext) -> PluginResult<()> {
        log::debug!("{} created as {}", Self::NAME, context.plugin_id());
        Ok(())
    }

    async fn on_destroy(&self) -> PluginResult<()> {
        log::debug!("{} saw {} events", Self::NAME, self.events_seen());
        Ok(())
    }

    async fn handle_event(&self, event: &Event) -> PluginResult<()> {
        self.seen.fetch_add(1, Ordering::Relaxed);
        let at = event_time(event);
        match event {
            Event::Plugin(e) => log::debug!(
                "[{}] plugin {:?}: {} ({}) bundle={:?}",
                at,
                e.event_type,
                e.plugin_name,
                e.plugin_id,
                e.bundle
            ),
            Event::Bundle(e) => log::debug!(
                "[{}] bundle {:?}: {} ({} plugins)",
                at,
                e.event_type,
                e.bundle_name,
                e.plugin_count
            ),
            Event::System(e) => log::debug!("[{}] system {:?}", at, e.event_type),
            Event::Host(e) => log::debug!("[{}] host event '{}': {}", at, e.topic, e.payload),
        }
        Ok(())
    }
}

// UTC wall clock time of the event, millisecond precision
fn event_time(event: &Event) -> String {
    DateTime::<Utc>::from(event.timestamp())
        .format("%H:%M:%S%.3f")
        .to_string()
}
