//! Plugin System Module
//!
//! Loads bundles of plugins into isolated loader contexts, tracks every plugin
//! instance the host runs and couples their lifecycle to the event bus.

// Internal modules - all access should go through api module
pub(crate) mod builtin;
pub(crate) mod context;
pub(crate) mod descriptor;
pub(crate) mod discovery;
pub(crate) mod error;
pub(crate) mod events;
pub(crate) mod external;
pub(crate) mod loader;
pub(crate) mod manager;
pub(crate) mod registry;
pub(crate) mod scan;
pub(crate) mod settings;
pub(crate) mod subscriber;
pub(crate) mod traits;
pub(crate) mod types;

// Public API module - the only public interface for the plugin system
pub mod api;

#[cfg(test)]
mod tests;
