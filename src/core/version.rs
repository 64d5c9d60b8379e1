//! Build metadata and the plugin API version shared by the host and native bundles.
//! The constants are generated by the build script from Cargo.toml.

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Fallback when the manifest carries no usable `plugin_api_version`.
const DEFAULT_API_VERSION: u32 = 20250727;

/// Plugin API version this build was compiled against.
pub fn get_api_version() -> u32 {
    PLUGIN_API_VERSION.parse().unwrap_or(DEFAULT_API_VERSION)
}

/// Compiler version string captured by the build script.
///
/// Bundles exchange trait objects with the host through the Rust ABI, so a bundle
/// built by a different compiler is refused at load time.
pub fn rustc_version() -> &'static str {
    RUSTC_VERSION
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// One-line version banner used by the CLI.
pub fn long_version() -> String {
    format!(
        "{} (api {}, {}, built {})",
        env!("CARGO_PKG_VERSION"),
        get_api_version(),
        git_hash(),
        build_time()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_is_date_shaped() {
        let version = get_api_version();
        // YYYYMMDD
        assert!(version > 20000000 && version < 30000000);
    }

    #[test]
    fn test_long_version_contains_package_version() {
        let banner = long_version();
        assert!(banner.starts_with(env!("CARGO_PKG_VERSION")));
        assert!(banner.contains(&get_api_version().to_string()));
    }

    #[test]
    fn test_rustc_version_captured() {
        assert!(!rustc_version().is_empty());
    }
}
