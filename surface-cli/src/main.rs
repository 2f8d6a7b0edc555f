//! Surface CLI - Command-line interface for API surface checks

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use surface_core::{
    check_all, compare_schemas, derive_schema, extract_package, package_files, ApiModel, Config,
    Diff, ExtractOptions, Schema, SurfaceError,
};

#[derive(Parser)]
#[command(name = "surface")]
#[command(about = "Public API surface extraction, diffing and schema checks", long_about = None)]
struct Cli {
    /// Configuration file (embedded defaults when omitted)
    #[arg(long, global = true, env = "SURFACE_CONFIG")]
    config: Option<PathBuf>,

    /// Output errors as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a package's API model
    Extract {
        /// Package directory
        path: PathBuf,

        /// Write the snapshot here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Diff two API models (package directories or snapshot files)
    Diff {
        /// Previous model
        left: PathBuf,

        /// Current model
        right: PathBuf,

        /// Fail when the right side adds surface
        #[arg(long)]
        fail_on_added: bool,

        /// Fail when the right side removes surface
        #[arg(long)]
        fail_on_removed: bool,
    },

    /// Derive a package's configuration schema
    Schema {
        /// Package directory
        path: PathBuf,

        /// Compare against the committed schema file instead of printing
        #[arg(long)]
        check: bool,
    },

    /// Run all policy checks over every package under a root
    Check {
        /// Root directory
        path: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Extract { path, output } => cmd_extract(&path, output.as_deref(), &config),
        Commands::Diff {
            left,
            right,
            fail_on_added,
            fail_on_removed,
        } => cmd_diff(&left, &right, fail_on_added, fail_on_removed, &config),
        Commands::Schema { path, check } => cmd_schema(&path, check, &config),
        Commands::Check { path } => cmd_check(&path, &config),
    });

    if let Err(e) = result {
        if cli.json {
            let error_json = serde_json::json!({ "error": e.to_string() });
            eprintln!("{}", serde_json::to_string_pretty(&error_json).unwrap());
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> surface_core::Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::from_toml(surface_core::config::DEFAULT_CONFIG),
    }
}

fn cmd_extract(
    path: &Path,
    output: Option<&Path>,
    config: &Config,
) -> surface_core::Result<()> {
    let model = extract_dir(path, config)?;
    match output {
        Some(output) => {
            model.write_snapshot(output)?;
            println!("{} {}", "Wrote".green(), output.display());
        }
        None => println!("{}", model.to_pretty_json()?),
    }
    Ok(())
}

fn cmd_diff(
    left: &Path,
    right: &Path,
    fail_on_added: bool,
    fail_on_removed: bool,
    config: &Config,
) -> surface_core::Result<()> {
    let left_model = load_model(left, config)?;
    let right_model = load_model(right, config)?;
    let diff = Diff::compare(&left_model, &right_model);

    if diff.is_unchanged() {
        println!("{}", "No API changes".green());
        return Ok(());
    }
    if let Some(report) = diff.error(fail_on_added, fail_on_removed) {
        return Err(SurfaceError::CheckFailed(report));
    }
    if let Some(report) = diff.error(true, true) {
        println!("{}", report);
    }
    Ok(())
}

fn cmd_schema(path: &Path, check: bool, config: &Config) -> surface_core::Result<()> {
    let model = extract_dir(path, config)?;
    let Some(name) = model.config_struct_name.clone() else {
        return Err(SurfaceError::CheckFailed(
            "no configuration factory found".to_string(),
        ));
    };
    let config_struct = model.struct_named(&name).ok_or_else(|| {
        SurfaceError::CheckFailed(format!("configuration struct {} not found", name))
    })?;
    let derived = derive_schema(config_struct, &model, &config.schema.overrides)?;
    if check {
        let committed = Schema::load(&path.join(&config.factory.schema_file))?;
        compare_schemas(&committed, &derived)?;
        println!("{} schema for {}", "OK".green(), name);
    } else {
        println!("{}", derived.to_pretty_json()?);
    }
    Ok(())
}

fn cmd_check(path: &Path, config: &Config) -> surface_core::Result<()> {
    let count = check_all(path, config)?;
    println!("{} {} packages", "Checked".green(), count);
    Ok(())
}

fn extract_dir(path: &Path, config: &Config) -> surface_core::Result<ApiModel> {
    let options = ExtractOptions::from_config(config)?;
    let files = package_files(path)?;
    let mut model = extract_package(&files, &options)?;
    model.sort();
    Ok(model)
}

/// A directory is extracted fresh; anything else loads as a snapshot.
fn load_model(path: &Path, config: &Config) -> surface_core::Result<ApiModel> {
    if path.is_dir() {
        extract_dir(path, config)
    } else {
        let mut model = ApiModel::load_snapshot(path)?;
        model.sort();
        Ok(model)
    }
}
