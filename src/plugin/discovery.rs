//! Plugin discovery
//!
//! Enumerates constructible implementations of [`Plugin`], either across the
//! whole process or inside one bundle's loader context.

use crate::notifications::bus::panic_message;
use crate::plugin::builtin::api::builtin_entries;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::external::api::{PluginConstructorFn, PluginRegistrar};
use crate::plugin::external::native::NativeLoaderContext;
use crate::plugin::loader::LoaderContext;
use crate::plugin::traits::Plugin;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Where to look for implementations
#[derive(Clone, Copy)]
pub enum DiscoveryScope<'a> {
    /// Everything registered in the running process
    Process,
    /// Only what the given bundle exports
    Bundle(&'a dyn LoaderContext),
}

impl std::fmt::Debug for DiscoveryScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryScope::Process => write!(f, "Process"),
            DiscoveryScope::Bundle(context) => write!(f, "Bundle({})", context.location()),
        }
    }
}

type Constructor = Arc<dyn Fn() -> Arc<dyn Plugin> + Send + Sync>;

/// A discovered implementation that can be instantiated
#[derive(Clone)]
pub struct PluginFactory {
    type_name: String,
    constructor: Constructor,
}

impl std::fmt::Debug for PluginFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginFactory")
            .field("type_name", &self.type_name)
            .finish()
    }
}

impl PluginFactory {
    pub fn new<F>(type_name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Arc<dyn Plugin> + Send + Sync + 'static,
    {
        Self {
            type_name: type_name.into(),
            constructor: Arc::new(constructor),
        }
    }

    /// Fully qualified type name of the implementation
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Type name without its module path
    pub fn short_name(&self) -> &str {
        self.type_name
            .rsplit("::")
            .next()
            .unwrap_or(&self.type_name)
    }

    /// Construct a new instance. A panicking constructor becomes `PluginInitFailed`.
    pub fn instantiate(&self) -> PluginResult<Arc<dyn Plugin>> {
        catch_unwind(AssertUnwindSafe(|| (self.constructor)())).map_err(|panic| {
            PluginError::init_failed(
                self.short_name(),
                format!("constructor panicked: {}", panic_message(panic.as_ref())),
            )
        })
    }
}

/// Enumerates plugin implementations in a scope
pub trait DiscoveryService: Send + Sync {
    fn find_implementations(&self, scope: DiscoveryScope<'_>) -> PluginResult<Vec<PluginFactory>>;
}

/// Default discovery: `builtin_plugin!` registrations for the process scope, the
/// exported declaration for native bundles.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDiscovery;

impl DiscoveryService for DefaultDiscovery {
    fn find_implementations(&self, scope: DiscoveryScope<'_>) -> PluginResult<Vec<PluginFactory>> {
        match scope {
            DiscoveryScope::Process => {
                let factories: Vec<PluginFactory> = builtin_entries()
                    .map(|entry| PluginFactory::new(entry.type_name, entry.constructor))
                    .collect();
                log::debug!("Found {} builtin plugin(s)", factories.len());
                Ok(factories)
            }
            DiscoveryScope::Bundle(context) => {
                let native = context
                    .as_any()
                    .downcast_ref::<NativeLoaderContext>()
                    .ok_or_else(|| PluginError::DiscoveryFailed {
                        cause: format!(
                            "{} is not a native bundle context",
                            context.location()
                        ),
                    })?;

                let mut collector = FactoryCollector::default();
                catch_unwind(AssertUnwindSafe(|| native.register_plugins(&mut collector)))
                    .map_err(|panic| PluginError::DiscoveryFailed {
                        cause: format!(
                            "registration in {} panicked: {}",
                            context.location(),
                            panic_message(panic.as_ref())
                        ),
                    })?;

                log::debug!(
                    "Found {} plugin(s) in {}",
                    collector.factories.len(),
                    context.location()
                );
                Ok(collector.factories)
            }
        }
    }
}

#[derive(Default)]
struct FactoryCollector {
    factories: Vec<PluginFactory>,
}

impl PluginRegistrar for FactoryCollector {
    fn register_plugin(&mut self, type_name: &str, constructor: PluginConstructorFn) {
        log::trace!("Bundle registered {}", type_name);
        self.factories.push(PluginFactory::new(type_name, constructor));
    }
}
