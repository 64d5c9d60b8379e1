//! TOML configuration file loading
//!
//! Manager settings sit at the top level of the file, logging settings under a
//! `[logging]` table. Command line flags are applied on top afterwards.

use crate::app::cli::args::Args;
use crate::core::error_handling::ContextualError;
use crate::core::logging::{level_for_verbosity, LogFormat, LogSettings};
use crate::plugin::settings::ManagerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "bundlehost";
const CONFIG_FILE_NAME: &str = "bundlehost.toml";
const BUNDLES_DIR_NAME: &str = "bundles";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Error reading configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing configuration file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, ConfigError::NotFound { .. } | ConfigError::Parse { .. })
    }

    fn user_message(&self) -> Option<String> {
        if self.is_user_actionable() {
            Some(self.to_string())
        } else {
            None
        }
    }
}

/// Everything the host reads from its configuration file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HostConfig {
    #[serde(flatten)]
    pub manager: ManagerConfig,
    pub logging: LogSettings,
}

/// `<config dir>/bundlehost/bundlehost.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// `<config dir>/bundlehost/bundles`, used when no bundle directory is configured
pub fn default_bundle_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(BUNDLES_DIR_NAME))
}

/// Load the configuration.
///
/// An explicit path must exist. Without one the default path is used if present,
/// otherwise built-in defaults apply.
pub async fn load_config(explicit: Option<&Path>) -> Result<HostConfig, ConfigError> {
    let path = match explicit {
        Some(path) if !path.exists() => {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                log::trace!("No configuration file; using defaults");
                return Ok(HostConfig::default());
            }
        },
    };

    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
    parse_config(&path, &contents)
}

pub fn parse_config(path: &Path, contents: &str) -> Result<HostConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl HostConfig {
    /// Apply command line overrides
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(dir) = &args.bundle_dir {
            self.manager.bundle_dir = Some(dir.clone());
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if let Some(format) = args
            .log_format
            .as_deref()
            .and_then(|f| f.parse::<LogFormat>().ok())
        {
            self.logging.format = format;
        }
        if let Some(file) = args.log_file_override() {
            self.logging.file = file;
        }
        self.logging.level = level_for_verbosity(&self.logging.level, args.verbosity());
        self.logging.color = args.use_color();
    }

    /// Configured bundle directory, falling back to the per-user default
    pub fn bundle_dir(&self) -> Option<PathBuf> {
        self.manager.bundle_dir.clone().or_else(default_bundle_dir)
    }
}
