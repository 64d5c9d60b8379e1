//! Native bundle ABI
//!
//! A bundle is a `cdylib` that exports one static, [`BundleDeclaration`], under the
//! symbol `BUNDLEHOST_DECLARATION`. The easiest way to produce it is the
//! [`declare_bundle!`](crate::declare_bundle) macro:
//!
//! ```ignore
//! #[derive(Default)]
//! struct Greeter;
//!
//! #[async_trait::async_trait]
//! impl bundlehost::plugin::api::Plugin for Greeter {
//!     fn plugin_name(&self) -> &str {
//!         "greeter"
//!     }
//! }
//!
//! bundlehost::declare_bundle! {
//!     descriptor: include_str!("../plugin.json"),
//!     plugins: [Greeter],
//! }
//! ```
//!
//! Plugins cross the library boundary as Rust trait objects, so the bundle must be
//! built with the same compiler and plugin API version as the host. Both are
//! recorded in the declaration and checked when the bundle is opened.

use crate::plugin::traits::Plugin;
use std::sync::Arc;

/// Name of the exported declaration symbol
pub const DECLARATION_SYMBOL: &[u8] = b"BUNDLEHOST_DECLARATION\0";

/// Name of the descriptor resource every bundle must carry
pub const DESCRIPTOR_RESOURCE: &str = "plugin.json";

/// Default constructor of a plugin type exported by a bundle
pub type PluginConstructorFn = fn() -> Arc<dyn Plugin>;

/// Exported by every native bundle
#[derive(Clone, Copy)]
pub struct BundleDeclaration {
    pub api_version: &'static str,
    pub rustc_version: &'static str,
    /// Contents of the bundle's `plugin.json`
    pub descriptor: Option<&'static str>,
    pub register: fn(&mut dyn PluginRegistrar),
}

/// Receives the plugin types a bundle exports
pub trait PluginRegistrar {
    fn register_plugin(&mut self, type_name: &str, constructor: PluginConstructorFn);
}

/// Declare a native bundle.
///
/// `descriptor` is the JSON text of the bundle's `plugin.json`; every listed
/// plugin type must implement `Default`.
#[macro_export]
macro_rules! declare_bundle {
    (descriptor: $descriptor:expr, plugins: [$($plugin:ty),* $(,)?] $(,)?) => {
        #[no_mangle]
        pub static BUNDLEHOST_DECLARATION: $crate::plugin::api::BundleDeclaration =
            $crate::plugin::api::BundleDeclaration {
                api_version: $crate::core::version::PLUGIN_API_VERSION,
                rustc_version: $crate::core::version::RUSTC_VERSION,
                descriptor: ::std::option::Option::Some($descriptor),
                register: {
                    fn register(registrar: &mut dyn $crate::plugin::api::PluginRegistrar) {
                        $(
                            registrar.register_plugin(
                                ::std::any::type_name::<$plugin>(),
                                || -> ::std::sync::Arc<dyn $crate::plugin::api::Plugin> {
                                    ::std::sync::Arc::new(
                                        <$plugin as ::std::default::Default>::default(),
                                    )
                                },
                            );
                        )*
                    }
                    register
                },
            };
    };
}
