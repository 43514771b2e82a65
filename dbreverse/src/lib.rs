//! dbreverse: generate source files from database schema metadata
//!
//! Reads tables from MySQL, PostgreSQL, SQLite or a DDL file, filters them with glob
//! patterns and renders each reverse target through a Tera template. Built-in
//! languages (`golang`, `rust`) supply a default template, template funcs, an
//! import generator and a formatter.
//!
//! # Configuration
//!
//! ```yaml
//! kind: reverse
//! name: mydb
//! source:
//!   database: mysql
//!   conn_str: mysql://root@localhost/test
//! targets:
//!   - type: codes
//!     include_tables: ["user*"]
//!     exclude_tables: ["*_log"]
//!     language: golang
//!     output_dir: ./models
//! ```
//!
//! # Usage in build.rs
//!
//! Put the same configuration under `[package.metadata.dbreverse]`:
//!
//! ```toml
//! [package.metadata.dbreverse]
//! source = { database = "ddl", conn_str = "schema.sql" }
//!
//! [[package.metadata.dbreverse.targets]]
//! language = "rust"
//! ```
//!
//! ```rust,ignore
//! fn main() {
//!     dbreverse::generate_from_cargo_metadata()
//!         .expect("Failed to generate models");
//! }
//! ```
//!
//! Output goes to `OUT_DIR` unless a target names an `output_dir`:
//!
//! ```rust,ignore
//! mod models {
//!     include!(concat!(env!("OUT_DIR"), "/models.rs"));
//! }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! dbreverse -f custom.yml generate
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod language;
pub mod naming;
pub mod output;
pub mod render;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use dbreverse_schema::{Database, Table};

pub use config::{ReverseConfig, ReverseSource, ReverseTarget};
pub use dbreverse_schema as schema;
pub use error::{ReverseError, Result};
pub use output::{GeneratedFile, WriteOptions, WriteSummary};
pub use render::{FuncMap, Generator};

/// Load a reverse config file and run every target in it
pub async fn reverse(path: &Path) -> Result<WriteSummary> {
    let config = ReverseConfig::load(path)?;
    run(&config, WriteOptions::default()).await
}

/// Run a reverse config given as YAML text
pub async fn reverse_from_str(yaml: &str) -> Result<WriteSummary> {
    let config = ReverseConfig::from_yaml_str(yaml)?;
    run(&config, WriteOptions::default()).await
}

/// Main entry point: validate, read the schema once, then run each target in order
pub async fn run(config: &ReverseConfig, opts: WriteOptions) -> Result<WriteSummary> {
    config.validate()?;

    info!(
        "Reading {} schema for {:?}",
        config.source.database, config.name
    );
    let tables =
        dbreverse_schema::fetch_tables(&config.source.database, &config.source.conn_str).await?;
    info!("Found {} tables", tables.len());

    let mut summary = WriteSummary::default();
    for (i, target) in config.targets.iter().enumerate() {
        info!("Running target #{} into {:?}", i, target.output_dir());
        summary.extend(run_target(&tables, target, opts)?);
    }

    info!(
        "Reverse complete: {} file(s) changed, {} written",
        summary.changed.len(),
        summary.written.len()
    );
    Ok(summary)
}

/// Filter, render and write a single target
pub fn run_target(tables: &[Table], target: &ReverseTarget, opts: WriteOptions) -> Result<WriteSummary> {
    let tables = filter::filter_tables(
        tables.to_vec(),
        &target.include_tables,
        &target.exclude_tables,
    )?;
    debug!(
        "After filtering: {} tables (include={:?}, exclude={:?})",
        tables.len(),
        target.include_tables,
        target.exclude_tables
    );

    let generator = Generator::new(target)?;
    let files = generator.generate(&tables)?;
    output::write_files(&files, opts)
}

#[derive(Debug, serde::Deserialize)]
struct CargoToml {
    package: Option<CargoPackage>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoPackage {
    metadata: Option<CargoPackageMetadata>,
}

#[derive(Debug, serde::Deserialize)]
struct CargoPackageMetadata {
    dbreverse: Option<ReverseConfig>,
}

/// Generate code from `[package.metadata.dbreverse]` in Cargo.toml
///
/// Meant to be called from build.rs. A `ddl` or `sqlite` source path, relative
/// `output_dir`s and relative `template_path`s are resolved against the
/// crate root; targets without `output_dir` write into `OUT_DIR`.
///
/// ```toml
/// [package.metadata.dbreverse]
/// source = { database = "ddl", conn_str = "schema.sql" }
///
/// [[package.metadata.dbreverse.targets]]
/// language = "rust"
/// exclude_tables = ["schema_*"]
/// ```
pub fn generate_from_cargo_metadata() -> Result<WriteSummary> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").map(PathBuf::from).map_err(|_| {
        ReverseError::ConfigError(
            "CARGO_MANIFEST_DIR not set - are you running from build.rs?".into(),
        )
    })?;

    let cargo_toml_path = manifest_dir.join("Cargo.toml");
    let cargo_toml_content = std::fs::read_to_string(&cargo_toml_path)?;

    let cargo_toml: CargoToml = toml::from_str(&cargo_toml_content).map_err(|e| {
        ReverseError::ConfigError(format!(
            "Failed to parse {}: {}",
            cargo_toml_path.display(),
            e
        ))
    })?;

    let mut config = cargo_toml
        .package
        .and_then(|p| p.metadata)
        .and_then(|m| m.dbreverse)
        .ok_or_else(|| {
            ReverseError::ConfigError(
                "Missing [package.metadata.dbreverse] section in Cargo.toml".into(),
            )
        })?;

    let out_dir = std::env::var("OUT_DIR").map(PathBuf::from).map_err(|_| {
        ReverseError::ConfigError("OUT_DIR not set - are you running from build.rs?".into())
    })?;

    println!("cargo:rerun-if-changed={}", cargo_toml_path.display());

    if matches!(
        config.source.database.parse::<Database>(),
        Ok(Database::Ddl | Database::Sqlite)
    ) {
        let schema_path = manifest_dir.join(&config.source.conn_str);
        println!("cargo:rerun-if-changed={}", schema_path.display());
        config.source.conn_str = schema_path.display().to_string();
    }

    for target in &mut config.targets {
        target.output_dir = Some(match target.output_dir.take() {
            Some(dir) => manifest_dir.join(dir),
            None => out_dir.clone(),
        });
        if let Some(path) = target.template_path.take() {
            let path = manifest_dir.join(path);
            println!("cargo:rerun-if-changed={}", path.display());
            target.template_path = Some(path);
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(&config, WriteOptions::default()))
}
