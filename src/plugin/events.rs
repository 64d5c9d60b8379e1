//! Lifecycle events published by the plugin manager

use crate::notifications::api::{
    BundleEvent, BundleEventType, Event, PluginEvent, PluginEventType,
};
use crate::plugin::registry::PluginEntry;

pub(crate) fn plugin_event(event_type: PluginEventType, entry: &PluginEntry) -> Event {
    Event::Plugin(PluginEvent::new(
        event_type,
        entry.id,
        entry.name().to_string(),
        entry.origin.bundle().map(str::to_string),
    ))
}

pub(crate) fn plugin_added(entry: &PluginEntry) -> Event {
    plugin_event(PluginEventType::Added, entry)
}

pub(crate) fn plugin_removed(entry: &PluginEntry) -> Event {
    plugin_event(PluginEventType::Removed, entry)
}

pub(crate) fn bundle_loaded(name: &str, plugin_count: usize) -> Event {
    Event::Bundle(BundleEvent::new(
        BundleEventType::Loaded,
        name.to_string(),
        plugin_count,
    ))
}

pub(crate) fn bundle_unloaded(name: &str, plugin_count: usize) -> Event {
    Event::Bundle(BundleEvent::new(
        BundleEventType::Unloaded,
        name.to_string(),
        plugin_count,
    ))
}
