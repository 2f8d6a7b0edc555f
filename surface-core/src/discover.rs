//! Package discovery: group Go source files by directory.

use crate::config::Config;
use crate::error::SurfaceError;
use crate::Result;
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One discovered package: a directory and its non-test Go files, sorted.
#[derive(Debug, Clone)]
pub struct PackageFiles {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Walk a root and group Go files into packages, respecting .gitignore
/// and the configured path exclusions. Test files never take part.
pub fn discover_packages(root: &Path, config: &Config) -> Result<Vec<PackageFiles>> {
    let ignore_set = build_ignore_set(&config.ignore.paths)?;

    let mut builder = WalkBuilder::new(root);
    builder.hidden(false);
    builder.git_ignore(true);
    builder.git_global(true);
    builder.git_exclude(true);

    let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let path = entry.path();
        if path.is_dir() || !is_go_source(path) {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if ignore_set.is_match(relative) {
            continue;
        }
        let Some(parent) = path.parent() else {
            continue;
        };
        by_dir
            .entry(parent.to_path_buf())
            .or_default()
            .push(path.to_path_buf());
    }

    Ok(by_dir
        .into_iter()
        .map(|(dir, mut files)| {
            files.sort();
            PackageFiles { dir, files }
        })
        .collect())
}

/// Non-test Go files of a single directory, sorted.
pub fn package_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_dir() && is_go_source(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go") && !name.ends_with("_test.go")
}

/// Build the exclusion set; bare names are expanded to match the entry
/// itself and everything below it.
fn build_ignore_set(patterns: &[String]) -> Result<globset::GlobSet> {
    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        let glob_pattern = if pattern.contains('*') || pattern.contains('?') {
            pattern.clone()
        } else {
            format!("**/{}", pattern)
        };
        builder.add(
            globset::Glob::new(&glob_pattern)
                .map_err(|e| SurfaceError::GlobPattern(e.to_string()))?,
        );
        builder.add(
            globset::Glob::new(&format!("**/{}/**", pattern))
                .map_err(|e| SurfaceError::GlobPattern(e.to_string()))?,
        );
    }
    builder
        .build()
        .map_err(|e| SurfaceError::GlobPattern(e.to_string()))
}
