//! Type definitions for the plugin system
//!
//! Identity handles and metadata shared by the registry, the manager and events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Manager-assigned handle of a registered plugin instance.
///
/// A fresh id is handed out on every successful registration, so a plugin that is
/// removed and added again gets a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PluginId(u64);

impl PluginId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plugin-{}", self.0)
    }
}

/// Where a registered plugin came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginOrigin {
    /// Added explicitly by the host application
    Host,
    /// Found by process-wide discovery
    Discovered,
    /// Created from the named bundle
    Bundle(String),
}

impl PluginOrigin {
    /// Owning bundle name, if any
    pub fn bundle(&self) -> Option<&str> {
        match self {
            PluginOrigin::Bundle(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for PluginOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginOrigin::Host => write!(f, "host"),
            PluginOrigin::Discovered => write!(f, "discovered"),
            PluginOrigin::Bundle(name) => write!(f, "bundle:{name}"),
        }
    }
}

/// Bundle metadata read from its `plugin.json` descriptor
///
/// Only `name` is required. Fields the host does not know about are kept in
/// `extra` so `inspect` can show the whole descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    /// Where the bundle was loaded from; not part of the descriptor
    #[serde(skip_deserializing, default)]
    pub location: String,
}

impl BundleInfo {
    /// Minimal metadata with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            description: None,
            author: None,
            extra: serde_json::Map::new(),
            location: String::new(),
        }
    }
}

/// Snapshot of one registered plugin, used for listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginSummary {
    pub id: PluginId,
    pub name: String,
    /// Owning bundle, `None` for standalone plugins
    pub bundle: Option<String>,
    pub origin: String,
}
