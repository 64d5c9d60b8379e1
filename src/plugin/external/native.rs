//! Native loader context backed by `libloading`
//!
//! Each bundle gets its own `Library` handle. On unix the library is opened with
//! `RTLD_LOCAL`, so symbols of one bundle never satisfy lookups from another.

use crate::core::version;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::external::api::{
    BundleDeclaration, PluginRegistrar, DECLARATION_SYMBOL, DESCRIPTOR_RESOURCE,
};
use crate::plugin::loader::{ContextProvider, LoaderContext};
use libloading::Library;
use std::any::Any;
use std::path::Path;

/// Loader context of one opened shared library
pub struct NativeLoaderContext {
    location: String,
    declaration: BundleDeclaration,
    // Must outlive every value obtained through `declaration`
    library: Library,
}

impl NativeLoaderContext {
    /// Open `path` and validate its bundle declaration
    pub fn open(path: &Path) -> PluginResult<Self> {
        let location = path.display().to_string();
        let library = open_library(path).map_err(|e| PluginError::ContextOpenFailed {
            location: location.clone(),
            cause: e.to_string(),
        })?;

        // SAFETY: the symbol is a `BundleDeclaration` static produced by
        // `declare_bundle!`; the copy only holds 'static data owned by `library`,
        // which this context keeps alive.
        let declaration = unsafe {
            let symbol = library
                .get::<*const BundleDeclaration>(DECLARATION_SYMBOL)
                .map_err(|e| PluginError::ContextOpenFailed {
                    location: location.clone(),
                    cause: format!("not a bundle, missing declaration: {e}"),
                })?;
            **symbol
        };

        let context = Self {
            location,
            declaration,
            library,
        };
        if let Err(e) = context.check_compatibility() {
            context.release_library();
            return Err(e);
        }

        log::debug!(
            "Opened bundle library {} (api {})",
            context.location,
            context.declaration.api_version
        );
        Ok(context)
    }

    /// Run the bundle's registration function
    pub fn register_plugins(&self, registrar: &mut dyn PluginRegistrar) {
        (self.declaration.register)(registrar)
    }

    fn check_compatibility(&self) -> PluginResult<()> {
        if self.declaration.rustc_version != version::rustc_version() {
            return Err(PluginError::VersionIncompatible {
                message: format!(
                    "{} was built with {}, host uses {}",
                    self.location,
                    self.declaration.rustc_version,
                    version::rustc_version()
                ),
            });
        }
        if self.declaration.api_version != version::PLUGIN_API_VERSION {
            return Err(PluginError::VersionIncompatible {
                message: format!(
                    "{} targets plugin API {}, host provides {}",
                    self.location,
                    self.declaration.api_version,
                    version::PLUGIN_API_VERSION
                ),
            });
        }
        Ok(())
    }

    fn release_library(self) {
        let location = self.location;
        match self.library.close() {
            Ok(()) => log::debug!("Closed bundle library {}", location),
            Err(e) => log::warn!("Failed to close bundle library {}: {}", location, e),
        }
    }
}

impl LoaderContext for NativeLoaderContext {
    fn location(&self) -> &str {
        &self.location
    }

    fn resource(&self, name: &str) -> PluginResult<Option<Vec<u8>>> {
        if name == DESCRIPTOR_RESOURCE {
            return Ok(self.declaration.descriptor.map(|d| d.as_bytes().to_vec()));
        }
        Ok(None)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn release(self: Box<Self>) {
        (*self).release_library();
    }

    fn leak(self: Box<Self>) {
        log::warn!("Leaking bundle library {}", self.location);
        std::mem::forget(self);
    }
}

#[cfg(unix)]
fn open_library(path: &Path) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_LOCAL, RTLD_NOW};
    // SAFETY: loading runs the library's initialisers; bundles are trusted code.
    unsafe { UnixLibrary::open(Some(path), RTLD_NOW | RTLD_LOCAL).map(Library::from) }
}

#[cfg(not(unix))]
fn open_library(path: &Path) -> Result<Library, libloading::Error> {
    // SAFETY: loading runs the library's initialisers; bundles are trusted code.
    unsafe { Library::new(path) }
}

/// Default [`ContextProvider`]: every location is a native shared library
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeContextProvider;

impl ContextProvider for NativeContextProvider {
    fn open(&self, location: &str) -> PluginResult<Box<dyn LoaderContext>> {
        let context = NativeLoaderContext::open(Path::new(location))?;
        Ok(Box::new(context))
    }
}
