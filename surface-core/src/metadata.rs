//! Component classification from package metadata.

use serde::Deserialize;
use std::path::Path;

/// Class used when a package carries no metadata file.
pub const DEFAULT_CLASS: &str = "pkg";

/// Metadata file name, co-located with each package.
pub const METADATA_FILE: &str = "metadata.toml";

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    status: Status,
}

#[derive(Debug, Default, Deserialize)]
struct Status {
    #[serde(default)]
    class: Option<String>,
}

/// Read the component class for a package directory, or the default
/// class when no metadata is present.
pub fn component_class(dir: &Path) -> String {
    let path = dir.join(METADATA_FILE);
    let Ok(content) = std::fs::read_to_string(&path) else {
        return DEFAULT_CLASS.to_string();
    };
    match toml::from_str::<Metadata>(&content) {
        Ok(metadata) => metadata
            .status
            .class
            .unwrap_or_else(|| DEFAULT_CLASS.to_string()),
        Err(err) => {
            tracing::warn!(file = %path.display(), %err, "unreadable metadata, using default class");
            DEFAULT_CLASS.to_string()
        }
    }
}
