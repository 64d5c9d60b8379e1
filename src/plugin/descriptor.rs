//! Bundle descriptor (`plugin.json`) handling

use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::external::api::DESCRIPTOR_RESOURCE;
use crate::plugin::loader::LoaderContext;
use crate::plugin::types::BundleInfo;

const LOCATION_KEY: &str = "location";

/// Read and parse the descriptor embedded in a bundle
pub fn read_descriptor(context: &dyn LoaderContext) -> PluginResult<BundleInfo> {
    let location = context.location().to_string();
    let bytes = context
        .resource(DESCRIPTOR_RESOURCE)?
        .ok_or_else(|| PluginError::MissingDescriptor {
            location: location.clone(),
        })?;

    let mut info = parse_descriptor(&location, &bytes)?;
    info.location = location;
    Ok(info)
}

/// Parse descriptor bytes; the document must be a JSON object with a non-empty `name`
pub fn parse_descriptor(location: &str, bytes: &[u8]) -> PluginResult<BundleInfo> {
    let malformed = |cause: String| PluginError::MalformedDescriptor {
        location: location.to_string(),
        cause,
    };

    let mut info: BundleInfo =
        serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
    if info.name.trim().is_empty() {
        return Err(malformed("bundle name is empty".to_string()));
    }
    // `location` is filled in by the host
    if info.extra.remove(LOCATION_KEY).is_some() {
        log::warn!("Ignoring '{}' key in descriptor of {}", LOCATION_KEY, location);
    }
    Ok(info)
}
