use std::fs;
use std::path::Path;
use surface_core::{
    check_all, derive_schema, extract_package, package_files, ApiModel, Config, Diff,
    ExtractOptions,
};

const CONFORMING: &str = r#"package sample

type Config struct {
	Endpoint string `mapstructure:"endpoint"`
	Enabled  bool   `mapstructure:"enabled"`
}

func NewFactory() component.Factory {
	return component.Factory{}
}

func createDefaultConfig() component.Config {
	return &Config{}
}
"#;

fn write_component(dir: &Path, source: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("metadata.toml"), "[status]\nclass = \"receiver\"\n").unwrap();
    fs::write(dir.join("config.go"), source).unwrap();
}

fn extract_dir(dir: &Path, config: &Config) -> ApiModel {
    let options = ExtractOptions::from_config(config).unwrap();
    let files = package_files(dir).unwrap();
    let mut model = extract_package(&files, &options).unwrap();
    model.sort();
    model
}

fn commit_schema(dir: &Path, config: &Config) {
    let model = extract_dir(dir, config);
    let name = model.config_struct_name.clone().unwrap();
    let config_struct = model.struct_named(&name).unwrap();
    let schema = derive_schema(config_struct, &model, &config.schema.overrides).unwrap();
    fs::write(
        dir.join(&config.factory.schema_file),
        schema.to_pretty_json().unwrap(),
    )
    .unwrap();
}

#[test]
fn conforming_component_passes_all_checks() {
    let root = tempfile::tempdir().unwrap();
    let pkg = root.path().join("examplereceiver");
    write_component(&pkg, CONFORMING);

    let config = Config::from_toml(surface_core::config::DEFAULT_CONFIG).unwrap();
    commit_schema(&pkg, &config);

    assert_eq!(check_all(root.path(), &config).unwrap(), 1);
}

#[test]
fn stale_committed_schema_fails_the_run() {
    let root = tempfile::tempdir().unwrap();
    let pkg = root.path().join("examplereceiver");
    write_component(&pkg, CONFORMING);

    let config = Config::from_toml(surface_core::config::DEFAULT_CONFIG).unwrap();
    commit_schema(&pkg, &config);

    // Grow the configuration struct without refreshing the schema.
    let grown = CONFORMING.replace(
        "\tEnabled  bool   `mapstructure:\"enabled\"`\n",
        "\tEnabled  bool   `mapstructure:\"enabled\"`\n\tRetries  int    `mapstructure:\"retries\"`\n",
    );
    fs::write(pkg.join("config.go"), grown).unwrap();

    let err = check_all(root.path(), &config).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("config schema out of date"));
    assert!(message.contains("field count mismatch"));
}

#[test]
fn snapshot_diff_detects_removed_surface() {
    let root = tempfile::tempdir().unwrap();
    let pkg = root.path().join("examplereceiver");
    write_component(&pkg, CONFORMING);

    let config = Config::from_toml(surface_core::config::DEFAULT_CONFIG).unwrap();
    let before = extract_dir(&pkg, &config);
    let snapshot_path = root.path().join("api.json");
    before.write_snapshot(&snapshot_path).unwrap();

    // Dropping the factory from the sources is a removal against the
    // stored snapshot.
    let shrunk = CONFORMING.replace(
        "func NewFactory() component.Factory {\n\treturn component.Factory{}\n}\n\n",
        "",
    );
    fs::write(pkg.join("config.go"), shrunk).unwrap();
    let after = extract_dir(&pkg, &config);

    let stored = ApiModel::load_snapshot(&snapshot_path).unwrap();
    let diff = Diff::compare(&stored, &after);
    let report = diff.error(false, true).unwrap();
    assert_eq!(report, "missing function NewFactory");

    // The mirror comparison sees the same item as an addition.
    let mirror = Diff::compare(&after, &stored);
    assert_eq!(
        mirror.error(true, false).unwrap(),
        "new function NewFactory"
    );
}

#[test]
fn unchanged_package_diffs_clean_against_its_snapshot() {
    let root = tempfile::tempdir().unwrap();
    let pkg = root.path().join("examplereceiver");
    write_component(&pkg, CONFORMING);

    let config = Config::from_toml(surface_core::config::DEFAULT_CONFIG).unwrap();
    let model = extract_dir(&pkg, &config);
    let snapshot_path = root.path().join("api.json");
    model.write_snapshot(&snapshot_path).unwrap();

    let stored = ApiModel::load_snapshot(&snapshot_path).unwrap();
    let diff = Diff::compare(&stored, &model);
    assert!(diff.is_unchanged());
    assert_eq!(diff.error(true, true), None);
}
