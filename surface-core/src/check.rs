//! Package policy checks.
//!
//! A package passes when its surface conforms to the allow list for its
//! component class, exposes no unkeyed-literal-prone structs, and keeps
//! its committed configuration schema in sync. Violations are the tool's
//! output: they are collected per package and joined, never thrown one at
//! a time.

use crate::config::{AllowedFunction, Config, UnkeyedLiteralConfig};
use crate::discover::{discover_packages, PackageFiles};
use crate::error::SurfaceError;
use crate::extract::{extract_package, ExtractOptions};
use crate::metadata::component_class;
use crate::model::{is_exported, ApiModel};
use crate::schema::{compare_schemas, derive_schema, Schema};
use crate::Result;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;

/// Check every package under a root. All failing packages are reported in
/// one combined error; a clean run returns the number of packages seen.
pub fn check_all(root: &Path, config: &Config) -> Result<usize> {
    let packages = discover_packages(root, config)?;
    let options = ExtractOptions::from_config(config)?;
    let failures: Vec<String> = packages
        .par_iter()
        .filter_map(|package| check_package(package, config, &options).err())
        .map(|err| err.to_string())
        .collect();
    if failures.is_empty() {
        Ok(packages.len())
    } else {
        Err(SurfaceError::CheckFailed(failures.join("\n")))
    }
}

/// Check a single package. Policy violations aggregate into one
/// `SurfaceError::Policy`; extraction problems surface as-is.
pub fn check_package(
    package: &PackageFiles,
    config: &Config,
    options: &ExtractOptions,
) -> Result<()> {
    let class = component_class(&package.dir);
    tracing::debug!(dir = %package.dir.display(), %class, "checking package");

    let mut model = extract_package(&package.files, options)?;
    model.sort();
    if model.is_empty() {
        return Ok(());
    }

    let mut violations = Vec::new();
    check_allowed_functions(&model, &class, &config.allowed_functions, &mut violations);
    check_unkeyed_literals(&model, &config.unkeyed_literal, &mut violations);
    if config.checks.config_schema {
        check_config_schema(package, &model, config, &mut violations);
    }
    if config.checks.unreachable_structs {
        check_reachability(&model, &mut violations);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SurfaceError::Policy {
            path: package.dir.clone(),
            report: violations.join("\n"),
        })
    }
}

/// Every exported free function must match an allow-list entry applicable
/// to the class; classes with applicable entries must see at least one
/// match.
fn check_allowed_functions(
    model: &ApiModel,
    class: &str,
    allowed: &[AllowedFunction],
    violations: &mut Vec<String>,
) {
    let applicable: Vec<&AllowedFunction> = allowed
        .iter()
        .filter(|entry| entry.classes.is_empty() || entry.classes.iter().any(|c| c == class))
        .collect();
    if applicable.is_empty() {
        return;
    }
    let mut matched_any = false;
    for function in model.functions.iter().filter(|f| f.receiver.is_empty()) {
        let allowed = applicable.iter().any(|entry| {
            entry.name == function.name
                && entry.parameters == function.params
                && entry.return_types == function.return_types
        });
        if allowed {
            matched_any = true;
        } else {
            violations.push(format!(
                "function {} is not allowed for class {}",
                function.name, class
            ));
        }
    }
    if !matched_any {
        violations.push(format!("missing factory function for class {}", class));
    }
}

/// An exported struct whose fields are all named and exported can be
/// initialized positionally; past the field limit that is a violation.
fn check_unkeyed_literals(
    model: &ApiModel,
    rule: &UnkeyedLiteralConfig,
    violations: &mut Vec<String>,
) {
    if !rule.enabled {
        return;
    }
    for s in model.structs.iter().filter(|s| is_exported(&s.name)) {
        if s.fields.len() > rule.max_fields && s.fields.iter().all(|f| f.is_exported()) {
            violations.push(format!(
                "struct {} has {} fields and can be initialized with unkeyed fields",
                s.name,
                s.fields.len()
            ));
        }
    }
}

fn check_config_schema(
    package: &PackageFiles,
    model: &ApiModel,
    config: &Config,
    violations: &mut Vec<String>,
) {
    let Some(name) = &model.config_struct_name else {
        return;
    };
    let Some(config_struct) = model.struct_named(name) else {
        violations.push(format!("configuration struct {} not found in package", name));
        return;
    };
    let committed_path = package.dir.join(&config.factory.schema_file);
    if !committed_path.exists() {
        if config.checks.require_schema_file {
            violations.push(format!(
                "missing schema file {}",
                config.factory.schema_file
            ));
        }
        return;
    }
    let derived = match derive_schema(config_struct, model, &config.schema.overrides) {
        Ok(schema) => schema,
        Err(err) => {
            violations.push(err.to_string());
            return;
        }
    };
    let committed = match Schema::load(&committed_path) {
        Ok(schema) => schema,
        Err(err) => {
            violations.push(format!(
                "unreadable schema file {}: {}",
                config.factory.schema_file, err
            ));
            return;
        }
    };
    if let Err(err) = compare_schemas(&committed, &derived) {
        violations.push(format!("config schema out of date for {}:\n{}", name, err));
    }
}

/// Every exported struct must be reachable from the configuration struct
/// through field type references.
fn check_reachability(model: &ApiModel, violations: &mut Vec<String>) {
    let Some(root) = &model.config_struct_name else {
        return;
    };
    let mut reachable = BTreeSet::new();
    let mut stack = vec![root.clone()];
    while let Some(name) = stack.pop() {
        if !reachable.insert(name.clone()) {
            continue;
        }
        if let Some(s) = model.struct_named(&name) {
            for field in &s.fields {
                if model.struct_named(&field.field_type).is_some() {
                    stack.push(field.field_type.clone());
                }
            }
        }
    }
    for s in model.structs.iter().filter(|s| is_exported(&s.name)) {
        if !reachable.contains(&s.name) {
            violations.push(format!(
                "exported struct {} is not reachable from configuration struct {}",
                s.name, root
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn package_in(dir: &Path, files: &[(&str, &str)]) -> PackageFiles {
        let mut paths: Vec<PathBuf> = Vec::new();
        for (name, source) in files {
            let path = dir.join(name);
            fs::write(&path, source).unwrap();
            paths.push(path);
        }
        paths.sort();
        PackageFiles {
            dir: dir.to_path_buf(),
            files: paths,
        }
    }

    fn receiver_metadata(dir: &Path) {
        fs::write(
            dir.join(crate::metadata::METADATA_FILE),
            "[status]\nclass = \"receiver\"\n",
        )
        .unwrap();
    }

    fn default_options(config: &Config) -> ExtractOptions {
        ExtractOptions::from_config(config).unwrap()
    }

    #[test]
    fn test_factory_conforming_package_passes() {
        let dir = tempfile::tempdir().unwrap();
        receiver_metadata(dir.path());
        let package = package_in(
            dir.path(),
            &[(
                "factory.go",
                r#"package sample

func NewFactory() component.Factory {
	return component.Factory{}
}
"#,
            )],
        );
        let config = Config::from_toml(crate::config::DEFAULT_CONFIG).unwrap();
        check_package(&package, &config, &default_options(&config)).unwrap();
    }

    #[test]
    fn test_disallowed_function_and_missing_factory_both_report() {
        let dir = tempfile::tempdir().unwrap();
        receiver_metadata(dir.path());
        let package = package_in(
            dir.path(),
            &[(
                "extra.go",
                r#"package sample

func Helper() int {
	return 0
}
"#,
            )],
        );
        let config = Config::from_toml(crate::config::DEFAULT_CONFIG).unwrap();
        let err = check_package(&package, &config, &default_options(&config)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("function Helper is not allowed for class receiver"));
        assert!(message.contains("missing factory function for class receiver"));
    }

    #[test]
    fn test_unclassified_packages_skip_the_allow_list() {
        let dir = tempfile::tempdir().unwrap();
        let package = package_in(
            dir.path(),
            &[(
                "lib.go",
                r#"package sample

func Anything(a string) string {
	return a
}
"#,
            )],
        );
        let config = Config::from_toml(crate::config::DEFAULT_CONFIG).unwrap();
        check_package(&package, &config, &default_options(&config)).unwrap();
    }

    #[test]
    fn test_unkeyed_literal_prone_struct_reports() {
        let dir = tempfile::tempdir().unwrap();
        let package = package_in(
            dir.path(),
            &[(
                "wide.go",
                r#"package sample

type Wide struct {
	A string
	B string
	C string
	D string
	E string
	F string
}

type Guarded struct {
	A string
	B string
	C string
	D string
	E string
	F string
	private bool
}
"#,
            )],
        );
        let config = Config::from_toml(crate::config::DEFAULT_CONFIG).unwrap();
        let err = check_package(&package, &config, &default_options(&config)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("struct Wide has 6 fields"));
        assert!(!message.contains("Guarded"));
    }

    #[test]
    fn test_missing_schema_file_reports_when_required() {
        let dir = tempfile::tempdir().unwrap();
        let package = package_in(
            dir.path(),
            &[(
                "config.go",
                r#"package sample

type Config struct {
	Endpoint string `mapstructure:"endpoint"`
}

func createDefaultConfig() component.Config {
	return &Config{}
}
"#,
            )],
        );
        let mut config = Config::from_toml(crate::config::DEFAULT_CONFIG).unwrap();
        config.checks.require_schema_file = true;
        config.unkeyed_literal.enabled = false;
        let err = check_package(&package, &config, &default_options(&config)).unwrap_err();
        assert!(err.to_string().contains("missing schema file"));
    }

    #[test]
    fn test_unreachable_exported_struct_reports() {
        let dir = tempfile::tempdir().unwrap();
        let package = package_in(
            dir.path(),
            &[(
                "config.go",
                r#"package sample

type Config struct {
	Limits Limits `mapstructure:"limits"`
}

type Limits struct {
	Max int `mapstructure:"max"`
}

type Orphan struct {
	Value string `mapstructure:"value"`
}

func createDefaultConfig() component.Config {
	return &Config{}
}
"#,
            )],
        );
        let mut config = Config::from_toml(crate::config::DEFAULT_CONFIG).unwrap();
        config.checks.unreachable_structs = true;
        config.checks.config_schema = false;
        let err = check_package(&package, &config, &default_options(&config)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("exported struct Orphan is not reachable"));
        assert!(!message.contains("struct Limits is not"));
    }

    #[test]
    fn test_check_all_reports_every_failing_package() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for name in ["one", "two"] {
            let pkg_dir = root.join(name);
            fs::create_dir_all(&pkg_dir).unwrap();
            receiver_metadata(&pkg_dir);
            fs::write(
                pkg_dir.join("lib.go"),
                r#"package sample

func Helper() int {
	return 0
}
"#,
            )
            .unwrap();
        }
        let config = Config::from_toml(crate::config::DEFAULT_CONFIG).unwrap();
        let err = check_all(root, &config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("one"));
        assert!(message.contains("two"));
    }

    #[test]
    fn test_check_all_counts_clean_packages() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let pkg_dir = root.join("lib");
        fs::create_dir_all(&pkg_dir).unwrap();
        fs::write(
            pkg_dir.join("lib.go"),
            r#"package sample

func Anything(a string) string {
	return a
}
"#,
        )
        .unwrap();
        let config = Config::from_toml(crate::config::DEFAULT_CONFIG).unwrap();
        assert_eq!(check_all(root, &config).unwrap(), 1);
    }
}
