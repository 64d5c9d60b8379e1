//! Bundle directory scan
//!
//! Finds candidate bundle files below a root directory.

use glob::glob;
use std::path::{Path, PathBuf};

/// Directory names whose subtrees never contain bundles
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["lib", "deps"];

/// File extension of shared libraries on this platform
pub fn default_extension() -> &'static str {
    std::env::consts::DLL_EXTENSION
}

/// What a directory scan accepts
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    pub extension: String,
    pub excluded_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extension: default_extension().to_string(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Regular files under `root` with the configured extension, sorted by path.
///
/// A file is skipped if any directory between `root` and the file is named in
/// `excluded_dirs`. Unreadable entries are logged and skipped.
pub fn find_bundle_files(root: &Path, options: &ScanOptions) -> Vec<PathBuf> {
    let extension = options.extension.trim_start_matches('.');
    let root_pattern = glob::Pattern::escape(&root.to_string_lossy());
    let pattern = format!(
        "{}/**/*.{}",
        root_pattern.trim_end_matches('/'),
        glob::Pattern::escape(extension)
    );

    let entries = match glob(&pattern) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Invalid bundle search pattern '{}': {}", pattern, e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Skipping unreadable path during bundle scan: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .filter(|path| !in_excluded_dir(root, path, &options.excluded_dirs))
        .collect();

    files.sort();
    log::debug!(
        "Found {} bundle candidate(s) under {}",
        files.len(),
        root.display()
    );
    files
}

fn in_excluded_dir(root: &Path, path: &Path, excluded: &[String]) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    let Some(parent) = relative.parent() else {
        return false;
    };
    parent.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| excluded.iter().any(|e| e == name))
    })
}
