//! Error types for surface operations

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source parse error in {}: {message}", .path.display())]
    SourceParse { path: PathBuf, message: String },

    #[error("Unsupported type expression kind: {kind}")]
    UnsupportedType { kind: String },

    #[error("Unrecognized configuration factory return shape: {found}")]
    FactoryReturn { found: String },

    #[error("Glob pattern error: {0}")]
    GlobPattern(String),

    #[error("Function pattern error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Schema file not found: {}", .0.display())]
    SchemaMissing(PathBuf),

    #[error("{0}")]
    SchemaMismatch(String),

    #[error("Schema derivation failed:\n{0}")]
    SchemaDerive(String),

    #[error("Policy violations in {}:\n{report}", .path.display())]
    Policy { path: PathBuf, report: String },

    #[error("{0}")]
    CheckFailed(String),
}
