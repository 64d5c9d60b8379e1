//! Plugin Trait System
//!
//! The extension point implemented by everything the manager hosts.
//!
//! # Lifecycle
//!
//! A plugin instance is shared as `Arc<dyn Plugin>`; its identity is the address of
//! that shared instance, not its name. The manager drives each instance through:
//!
//! 1. `on_create` exactly once, before the instance is registered or subscribed
//! 2. `handle_event` for every accepted event while subscribed
//! 3. `on_destroy` exactly once, after deliveries stopped and before unsubscription
//!
//! Hooks must not call back into the manager's structural operations
//! (`add_plugin`, `load_bundle`, ...). Publishing through the context's
//! [`EventPublisher`](crate::notifications::api::EventPublisher) is fine.

use crate::notifications::api::{Event, EventFilter};
use crate::plugin::context::PluginContext;
use crate::plugin::error::PluginResult;
use std::sync::Arc;

/// Base plugin trait that all plugins must implement
#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
    /// Human-readable name, used in logs and events
    fn plugin_name(&self) -> &str;

    /// Events this plugin wants to receive
    fn event_filter(&self) -> EventFilter {
        EventFilter::All
    }

    /// Called once before the plugin is registered
    async fn on_create(&self, _context: &PluginContext) -> PluginResult<()> {
        Ok(())
    }

    /// Called once while the plugin is being removed
    async fn on_destroy(&self) -> PluginResult<()> {
        Ok(())
    }

    /// Handle an event published on the bus
    async fn handle_event(&self, _event: &Event) -> PluginResult<()> {
        Ok(())
    }
}

/// True if both handles refer to the same plugin instance
pub fn same_instance(a: &Arc<dyn Plugin>, b: &Arc<dyn Plugin>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quiet;

    #[async_trait::async_trait]
    impl Plugin for Quiet {
        fn plugin_name(&self) -> &str {
            "quiet"
        }
    }

    #[tokio::test]
    async fn test_default_hooks_succeed() {
        let plugin = Quiet;
        let context = PluginContext::detached();

        assert!(plugin.on_create(&context).await.is_ok());
        assert!(plugin.on_destroy().await.is_ok());
        assert_eq!(plugin.event_filter(), EventFilter::All);
    }

    #[test]
    fn test_identity_is_per_instance() {
        let a: Arc<dyn Plugin> = Arc::new(Quiet);
        let b: Arc<dyn Plugin> = Arc::new(Quiet);
        let a2 = a.clone();

        assert!(same_instance(&a, &a2));
        assert!(!same_instance(&a, &b));
    }
}
