//! Configuration for surface checks

use crate::SurfaceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default configuration as TOML
pub const DEFAULT_CONFIG: &str = r#"# Surface configuration

[ignore]
# Source files skipped entirely, matched against the base file name
files = ["*_test.go", "zz_generated*.go"]
# Exported function names tolerated outside the allow list (regex, matched as search)
functions = []
# Directory names excluded from package discovery
paths = [".git", "vendor", "testdata", "internal"]

[checks]
# Derive the configuration schema and compare it against the committed file
config_schema = true
# Treat a missing committed schema file as a violation instead of skipping
require_schema_file = false
# Require every exported struct to be reachable from the configuration struct
unreachable_structs = false

[unkeyed_literal]
enabled = true
max_fields = 5

[factory]
# Return type marking the unexported configuration factory
return_type = "component.Config"
# Committed schema file name, co-located with each package
schema_file = "config_schema.json"

[[allowed_functions]]
classes = ["receiver", "exporter", "processor", "connector", "extension"]
name = "NewFactory"
parameters = []
return_types = ["component.Factory"]

[schema.overrides]
# External types rendered as schema references, e.g.
# "confighttp.ClientConfig" = "confighttp.json"
"#;

/// Surface configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ignore: IgnoreConfig,
    #[serde(default)]
    pub checks: ChecksConfig,
    #[serde(default)]
    pub unkeyed_literal: UnkeyedLiteralConfig,
    #[serde(default)]
    pub factory: FactoryConfig,
    #[serde(default)]
    pub allowed_functions: Vec<AllowedFunction>,
    #[serde(default)]
    pub schema: SchemaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreConfig {
    #[serde(default = "default_ignored_files")]
    pub files: Vec<String>,
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default = "default_ignored_paths")]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksConfig {
    #[serde(default = "default_true")]
    pub config_schema: bool,
    #[serde(default)]
    pub require_schema_file: bool,
    #[serde(default)]
    pub unreachable_structs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnkeyedLiteralConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_fields")]
    pub max_fields: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoryConfig {
    #[serde(default = "default_factory_return_type")]
    pub return_type: String,
    #[serde(default = "default_schema_file")]
    pub schema_file: String,
}

/// One mandatory factory-function shape, applicable to the named
/// component classes (every class when empty).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowedFunction {
    #[serde(default)]
    pub classes: Vec<String>,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub return_types: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

// Default value functions
fn default_ignored_files() -> Vec<String> {
    vec!["*_test.go".to_string(), "zz_generated*.go".to_string()]
}
fn default_ignored_paths() -> Vec<String> {
    vec![
        ".git".to_string(),
        "vendor".to_string(),
        "testdata".to_string(),
        "internal".to_string(),
    ]
}
fn default_true() -> bool {
    true
}
fn default_max_fields() -> usize {
    5
}
fn default_factory_return_type() -> String {
    "component.Config".to_string()
}
fn default_schema_file() -> String {
    "config_schema.json".to_string()
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            files: default_ignored_files(),
            functions: Vec::new(),
            paths: default_ignored_paths(),
        }
    }
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            config_schema: true,
            require_schema_file: false,
            unreachable_structs: false,
        }
    }
}

impl Default for UnkeyedLiteralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_fields: default_max_fields(),
        }
    }
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            return_type: default_factory_return_type(),
            schema_file: default_schema_file(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| SurfaceError::ConfigParse(e.to_string()))
    }
}
