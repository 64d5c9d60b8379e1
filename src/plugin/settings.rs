//! Plugin manager settings
//!
//! Knobs for bundle lookup, discovery and teardown. Deserialised from the host
//! configuration file with kebab-case keys.

use crate::plugin::scan::{default_extension, ScanOptions, DEFAULT_EXCLUDED_DIRS};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default time to wait for in-flight deliveries before releasing a bundle
pub const DEFAULT_RELEASE_GRACE_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ManagerConfig {
    /// Directory scanned for bundles
    pub bundle_dir: Option<PathBuf>,
    /// Shared library extension, without the dot
    pub bundle_extension: String,
    /// Directory names skipped while scanning
    pub excluded_dirs: Vec<String>,
    /// Instantiate process-wide plugins at startup
    pub auto_discover: bool,
    /// Plugins never instantiated by process-wide discovery, by type or plugin name
    pub excluded_plugins: Vec<String>,
    pub release_grace_ms: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            bundle_dir: None,
            bundle_extension: default_extension().to_string(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect(),
            auto_discover: false,
            excluded_plugins: Vec::new(),
            release_grace_ms: DEFAULT_RELEASE_GRACE_MS,
        }
    }
}

impl ManagerConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            extension: self.bundle_extension.clone(),
            excluded_dirs: self.excluded_dirs.clone(),
        }
    }

    pub fn release_grace(&self) -> Duration {
        Duration::from_millis(self.release_grace_ms)
    }

    /// True if `name` (a type name, its last path segment, or a plugin name) is excluded
    pub fn is_excluded(&self, name: &str) -> bool {
        let short = name.rsplit("::").next().unwrap_or(name);
        self.excluded_plugins
            .iter()
            .any(|excluded| excluded == name || excluded == short)
    }
}
