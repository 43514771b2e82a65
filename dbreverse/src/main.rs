//! CLI entry point for dbreverse

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dbreverse::config::defaults;
use dbreverse::schema::Table;
use dbreverse::{language, ReverseConfig, WriteOptions};

#[derive(Parser)]
#[command(name = "dbreverse")]
#[command(about = "Generate source files for database tables from templates")]
#[command(version)]
struct Cli {
    /// Path to the reverse configuration file (YAML or TOML)
    #[arg(short = 'f', long = "file", default_value = defaults::CONFIG_FILE)]
    file: PathBuf,

    /// Connection string (overrides source.conn_str)
    #[arg(long)]
    conn_str: Option<String>,

    /// Dry run - show what would be written without writing files
    #[arg(long)]
    dry_run: bool,

    /// Fail if any generated file is out of date
    #[arg(long, conflicts_with = "dry_run")]
    check: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every target in the config (default)
    Generate,
    /// Inspect schema (show tables as the source reports them)
    Inspect,
    /// List the built-in languages
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Languages) = cli.command {
        list_languages();
        return Ok(());
    }

    // Load configuration first (before logging, so we can use config.log_level)
    let mut config = ReverseConfig::load(&cli.file)
        .with_context(|| format!("failed to load {}", cli.file.display()))?;

    // Initialize logging
    // Priority: RUST_LOG env var > config.log_level > default (debug for dev, info for release)
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };
    let log_level = config.log_level.as_deref().unwrap_or(default_level);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();

    if let Some(conn_str) = cli.conn_str {
        config.source.conn_str = conn_str;
    }

    if let Some(Commands::Inspect) = cli.command {
        let tables =
            dbreverse::schema::fetch_tables(&config.source.database, &config.source.conn_str)
                .await?;
        inspect_schema(&tables);
        return Ok(());
    }

    info!("Reversing with config: {:?}", cli.file);
    let opts = WriteOptions {
        dry_run: cli.dry_run,
        check: cli.check,
    };
    let summary = dbreverse::run(&config, opts).await?;

    if cli.dry_run {
        println!("Dry run mode - would write:");
        for path in &summary.changed {
            println!("  {}", path.display());
        }
    } else if cli.check {
        println!("All generated files are up to date");
    }

    info!("Reverse completed successfully");
    Ok(())
}

fn list_languages() {
    for language in language::languages() {
        let funcs: Vec<&str> = language.funcs.iter().map(|(name, _)| *name).collect();
        println!(
            "{:<8} {:<4} funcs: {}",
            language.name,
            language.ext_name,
            funcs.join(", ")
        );
    }
}

fn inspect_schema(tables: &[Table]) {
    println!("Found {} tables:\n", tables.len());
    for table in tables {
        match &table.comment {
            Some(comment) => println!("Table: {} ({})", table.name, comment),
            None => println!("Table: {}", table.name),
        }
        println!("  Columns:");
        for col in &table.columns {
            let nullable = if col.nullable { "NULL" } else { "NOT NULL" };
            let auto_inc = if col.is_auto_increment {
                " AUTO_INCREMENT"
            } else {
                ""
            };
            let mut data_type = col.sql_type.name.clone();
            if col.sql_type.length != 0 {
                data_type.push_str(&format!("({}", col.sql_type.length));
                if col.sql_type.length2 != 0 {
                    data_type.push_str(&format!(",{}", col.sql_type.length2));
                }
                data_type.push(')');
            }
            if col.unsigned {
                data_type.push_str(" UNSIGNED");
            }
            println!("    - {} {} {}{}", col.name, data_type, nullable, auto_inc);
            if let Some(default) = &col.default {
                println!("      DEFAULT {}", default);
            }
            if col.is_enum() {
                println!("      ENUM values: {:?}", col.enum_options);
            }
            if col.is_set() {
                println!("      SET values: {:?}", col.set_options);
            }
        }
        if !table.primary_keys.is_empty() {
            println!("  Primary Key: {:?}", table.primary_keys);
        }
        if !table.indexes.is_empty() {
            println!("  Indexes:");
            for idx in table.indexes.values() {
                let unique = match idx.index_type {
                    dbreverse::schema::IndexType::Unique => "UNIQUE ",
                    dbreverse::schema::IndexType::Index => "",
                };
                println!("    - {}INDEX {} ({:?})", unique, idx.name, idx.cols);
            }
        }
        println!();
    }
}
