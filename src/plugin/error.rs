//! Plugin Error Handling
//!
//! Error types for bundle loading, plugin lifecycle transitions and discovery.

use thiserror::Error;

/// Result type alias for plugin operations
pub type PluginResult<T> = std::result::Result<T, PluginError>;

/// Error types for plugin system operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PluginError {
    /// The bundle carries no `plugin.json` descriptor
    #[error("Bundle at '{location}' has no plugin.json descriptor")]
    MissingDescriptor { location: String },

    /// The descriptor exists but is not a JSON object with a `name`
    #[error("Bundle at '{location}' has a malformed descriptor: {cause}")]
    MalformedDescriptor { location: String, cause: String },

    /// A bundle with the same name is already registered
    #[error("A bundle named '{name}' is already loaded")]
    DuplicateBundle { name: String },

    /// Construction or `on_create` of a plugin failed
    #[error("Failed to initialise plugin '{plugin_name}': {cause}")]
    PluginInitFailed { plugin_name: String, cause: String },

    /// The loader context for a bundle could not be opened
    #[error("Failed to open bundle at '{location}': {cause}")]
    ContextOpenFailed { location: String, cause: String },

    /// Plugin API version incompatible with system
    #[error("Version incompatible: {message}")]
    VersionIncompatible { message: String },

    /// The discovery service could not enumerate implementations
    #[error("Plugin discovery failed: {cause}")]
    DiscoveryFailed { cause: String },

    /// Plugin execution failed
    #[error("Plugin '{plugin_name}' failed during '{operation}': {cause}")]
    ExecutionError {
        plugin_name: String,
        operation: String,
        cause: String,
    },

    /// Plugin not found in registry
    #[error("Plugin not found: {plugin_name}")]
    PluginNotFound { plugin_name: String },
}

impl PluginError {
    /// Convenience constructor for failures raised from inside plugin hooks
    pub fn execution(
        plugin_name: impl Into<String>,
        operation: impl Into<String>,
        cause: impl std::fmt::Display,
    ) -> Self {
        PluginError::ExecutionError {
            plugin_name: plugin_name.into(),
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }

    /// Wrap another error as the cause of a failed plugin initialisation
    pub fn init_failed(plugin_name: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        PluginError::PluginInitFailed {
            plugin_name: plugin_name.into(),
            cause: cause.to_string(),
        }
    }
}

impl crate::core::error_handling::ContextualError for PluginError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            PluginError::MissingDescriptor { .. }
                | PluginError::MalformedDescriptor { .. }
                | PluginError::DuplicateBundle { .. }
                | PluginError::VersionIncompatible { .. }
                | PluginError::ContextOpenFailed { .. }
                | PluginError::PluginNotFound { .. }
        )
    }

    fn user_message(&self) -> Option<String> {
        match self {
            PluginError::MissingDescriptor { location } => Some(format!(
                "{location} is not a bundle: it does not declare a plugin.json descriptor"
            )),
            PluginError::MalformedDescriptor { location, cause } => {
                Some(format!("Invalid plugin.json in {location}: {cause}"))
            }
            PluginError::DuplicateBundle { name } => {
                Some(format!("Bundle '{name}' is already loaded"))
            }
            PluginError::VersionIncompatible { message } => Some(message.clone()),
            PluginError::ContextOpenFailed { location, cause } => {
                Some(format!("Cannot open {location}: {cause}"))
            }
            PluginError::PluginNotFound { plugin_name } => {
                Some(format!("No plugin named '{plugin_name}'"))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error_handling::ContextualError;

    #[test]
    fn test_display_messages() {
        let error = PluginError::DuplicateBundle {
            name: "greetings".to_string(),
        };
        assert_eq!(error.to_string(), "A bundle named 'greetings' is already loaded");

        let error = PluginError::execution("echo", "handle_event", "disk full");
        assert_eq!(
            error.to_string(),
            "Plugin 'echo' failed during 'handle_event': disk full"
        );
    }

    #[test]
    fn test_descriptor_errors_are_user_actionable() {
        let missing = PluginError::MissingDescriptor {
            location: "/tmp/libx.so".to_string(),
        };
        assert!(missing.is_user_actionable());
        assert!(missing.user_message().unwrap().contains("/tmp/libx.so"));

        let unknown = PluginError::PluginNotFound {
            plugin_name: "ghost".to_string(),
        };
        assert!(unknown.is_user_actionable());
        assert_eq!(unknown.user_message().unwrap(), "No plugin named 'ghost'");

        let init = PluginError::init_failed("echo", "boom");
        assert!(!init.is_user_actionable());
        assert!(init.user_message().is_none());
    }
}
