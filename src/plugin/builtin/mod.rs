//! Built-in Plugin Implementations
//!
//! Plugins that ship with the host. They are found by process-wide discovery.

pub mod api;
pub mod event_log;
