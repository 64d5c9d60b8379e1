//! API for builtin plugin registration and discovery
//!
//! Plugins compiled into the process register themselves with the
//! `builtin_plugin!` macro; process-wide discovery enumerates them through
//! `inventory`.

use crate::plugin::traits::Plugin;
use std::sync::Arc;

/// Entry for a builtin plugin in the process-wide registry
pub struct BuiltinPluginEntry {
    pub type_name: &'static str,
    pub constructor: fn() -> Arc<dyn Plugin>,
}

// Collect all builtin plugin entries
inventory::collect!(BuiltinPluginEntry);

/// Register a plugin type for process-wide discovery.
///
/// The type must implement `Default`; discovery constructs instances through it.
/// The registered type name is the invoking module path joined with the type.
#[macro_export]
macro_rules! builtin_plugin {
    ($plugin:ident) => {
        $crate::inventory::submit! {
            $crate::plugin::api::BuiltinPluginEntry {
                type_name: concat!(module_path!(), "::", stringify!($plugin)),
                constructor: || -> ::std::sync::Arc<dyn $crate::plugin::api::Plugin> {
                    ::std::sync::Arc::new(<$plugin as ::std::default::Default>::default())
                },
            }
        }
    };
}

/// All builtin plugin registrations, in link order
pub fn builtin_entries() -> impl Iterator<Item = &'static BuiltinPluginEntry> {
    inventory::iter::<BuiltinPluginEntry>.into_iter()
}
