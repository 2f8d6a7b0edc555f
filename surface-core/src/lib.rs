//! Surface Core - public API surface extraction and comparison
//!
//! This library parses the source files of a Go package, builds a
//! normalized model of its exported surface, diffs two such models to
//! detect breaking or additive changes, and derives a configuration
//! schema from struct tags for comparison against a committed schema.

pub mod check;
pub mod config;
pub mod diff;
pub mod discover;
pub mod error;
pub mod extract;
pub mod metadata;
pub mod model;
pub mod render;
pub mod schema;

pub use check::{check_all, check_package};
pub use config::Config;
pub use diff::Diff;
pub use discover::{discover_packages, package_files, PackageFiles};
pub use error::SurfaceError;
pub use extract::{extract_package, ExtractOptions};
pub use model::{ApiFunction, ApiInterface, ApiModel, ApiStruct, StructField};
pub use render::{render, TypeExpr};
pub use schema::{compare_schemas, derive_schema, Schema};

/// Result type alias for surface operations
pub type Result<T> = std::result::Result<T, SurfaceError>;
