//! Public API for the plugin system
//!
//! External modules and bundle authors import from here rather than directly
//! from the internal modules.

// Core plugin management
pub use crate::plugin::manager::{PluginManager, PluginManagerBuilder};
pub use crate::plugin::settings::{ManagerConfig, DEFAULT_RELEASE_GRACE_MS};

// Error handling
pub use crate::plugin::error::{PluginError, PluginResult};

// Plugin trait and runtime context
pub use crate::plugin::context::PluginContext;
pub use crate::plugin::traits::{same_instance, Plugin};

// Identity and metadata
pub use crate::plugin::types::{BundleInfo, PluginId, PluginOrigin, PluginSummary};

// Loader contexts and discovery seams
pub use crate::plugin::discovery::{
    DefaultDiscovery, DiscoveryScope, DiscoveryService, PluginFactory,
};
pub use crate::plugin::loader::{ContextProvider, LoaderContext};

// Native bundle ABI
pub use crate::plugin::external::api::{
    BundleDeclaration, PluginConstructorFn, PluginRegistrar, DECLARATION_SYMBOL,
    DESCRIPTOR_RESOURCE,
};
pub use crate::plugin::external::native::{NativeContextProvider, NativeLoaderContext};

// Builtin plugins
pub use crate::plugin::builtin::api::{builtin_entries, BuiltinPluginEntry};
pub use crate::plugin::builtin::event_log::EventLogPlugin;

// Descriptor and directory helpers
pub use crate::plugin::descriptor::{parse_descriptor, read_descriptor};
pub use crate::plugin::scan::{default_extension, find_bundle_files, ScanOptions};
