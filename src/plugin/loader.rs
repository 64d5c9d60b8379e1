//! Loader contexts
//!
//! A loader context is the isolated resolution scope a bundle's plugins live in.
//! The manager owns each context as a `Box<dyn LoaderContext>` and consumes it
//! exactly once, through `release` or, if plugin code may still be running,
//! through `leak`.

use crate::plugin::error::PluginResult;
use std::any::Any;

/// Isolated scope of one loaded bundle
pub trait LoaderContext: Send + Sync + 'static {
    /// Where the bundle was opened from
    fn location(&self) -> &str;

    /// Read a named resource embedded in the bundle; `Ok(None)` if absent
    fn resource(&self, name: &str) -> PluginResult<Option<Vec<u8>>>;

    /// Downcasting hook for discovery services that understand a concrete context
    fn as_any(&self) -> &dyn Any;

    /// Tear the context down. No plugin created from it may be alive.
    fn release(self: Box<Self>);

    /// Give up on the context without unloading it
    fn leak(self: Box<Self>) {
        std::mem::forget(self);
    }
}

impl std::fmt::Debug for dyn LoaderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderContext")
            .field("location", &self.location())
            .finish()
    }
}

/// Opens loader contexts for bundle locations
pub trait ContextProvider: Send + Sync {
    fn open(&self, location: &str) -> PluginResult<Box<dyn LoaderContext>>;
}
