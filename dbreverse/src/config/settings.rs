//! Reverse configuration: one source, many targets

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::defaults;
use crate::error::{ReverseError, Result};
use crate::language;
use crate::naming::NameMapper;

/// Top-level reverse configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseConfig {
    /// Always `reverse`; anything else is tolerated with a warning
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Free-form name of this configuration
    #[serde(default)]
    pub name: String,

    /// Where the schema metadata comes from
    pub source: ReverseSource,

    /// What to generate from it
    #[serde(default)]
    pub targets: Vec<ReverseTarget>,

    /// Log level (trace, debug, info, warn, error)
    /// Can be overridden by RUST_LOG env var
    #[serde(default)]
    pub log_level: Option<String>,
}

/// A reverse source: database kind plus connection string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReverseSource {
    /// `mysql`, `postgres` or `ddl`
    #[serde(default)]
    pub database: String,

    /// Connection URL, or the SQL file path for `ddl`
    #[serde(default)]
    pub conn_str: String,
}

/// A reverse target: which tables, how to name them, what to render
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseTarget {
    #[serde(rename = "type", default = "default_target_type")]
    pub target_type: String,

    /// Glob patterns; empty keeps every table
    #[serde(default)]
    pub include_tables: Vec<String>,

    /// Glob patterns; a match always drops the table
    #[serde(default)]
    pub exclude_tables: Vec<String>,

    #[serde(default = "default_mapper")]
    pub table_mapper: String,

    #[serde(default = "default_mapper")]
    pub column_mapper: String,

    /// Template file, used when `template` is not set
    #[serde(default)]
    pub template_path: Option<PathBuf>,

    /// Inline template text
    #[serde(default)]
    pub template: Option<String>,

    /// One file per table instead of a single `models` file
    #[serde(default)]
    pub multiple_files: bool,

    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Prefix trimmed from table names before rendering
    #[serde(default)]
    pub table_prefix: String,

    /// Built-in language providing template, funcs, formatter and importer
    #[serde(default)]
    pub language: String,

    /// Extra filter names, each aliasing a registered func
    #[serde(default)]
    pub funcs: BTreeMap<String, String>,

    /// Language whose formatter to use, or `none`
    #[serde(default)]
    pub formatter: String,

    /// Language whose import generator to use, or `none`
    #[serde(default, alias = "importer")]
    pub importter: String,

    /// Output file extension, with or without the leading dot
    #[serde(default)]
    pub ext_name: String,
}

fn default_kind() -> String {
    defaults::KIND.to_string()
}
fn default_target_type() -> String {
    defaults::TARGET_TYPE.to_string()
}
fn default_mapper() -> String {
    defaults::MAPPER.to_string()
}

impl Default for ReverseTarget {
    fn default() -> Self {
        Self {
            target_type: default_target_type(),
            include_tables: Vec::new(),
            exclude_tables: Vec::new(),
            table_mapper: default_mapper(),
            column_mapper: default_mapper(),
            template_path: None,
            template: None,
            multiple_files: false,
            output_dir: None,
            table_prefix: String::new(),
            language: String::new(),
            funcs: BTreeMap::new(),
            formatter: String::new(),
            importter: String::new(),
            ext_name: String::new(),
        }
    }
}

impl ReverseConfig {
    /// Load a config file (YAML or TOML, by extension) with environment
    /// overrides such as `DBREVERSE_SOURCE__CONN_STR`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReverseError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let builder = Config::builder().add_source(File::from(path)).add_source(
            Environment::with_prefix(defaults::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        let config: ReverseConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Parse inline YAML; the environment is not consulted
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ReverseConfig = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.kind != defaults::KIND {
            warn!(
                "Unexpected config kind {:?}, expected {:?}",
                self.kind,
                defaults::KIND
            );
        }

        self.source
            .database
            .parse::<dbreverse_schema::Database>()
            .map_err(|e| ReverseError::ValidationError(e.to_string()))?;

        if self.source.conn_str.is_empty() {
            return Err(ReverseError::ValidationError(
                "source.conn_str is required".into(),
            ));
        }

        if self.targets.is_empty() {
            warn!("Config {:?} has no targets, nothing will be generated", self.name);
        }

        for (i, target) in self.targets.iter().enumerate() {
            target.validate().map_err(|e| {
                ReverseError::ValidationError(format!("targets[{}]: {}", i, e))
            })?;
        }

        Ok(())
    }
}

impl ReverseTarget {
    /// Output directory, defaulting to the working directory
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(defaults::OUTPUT_DIR))
    }

    /// Validate a single target
    pub fn validate(&self) -> Result<()> {
        if self.target_type != defaults::TARGET_TYPE {
            warn!(
                "Unknown target type {:?}, treating it as {:?}",
                self.target_type,
                defaults::TARGET_TYPE
            );
        }

        NameMapper::from_name(&self.table_mapper)?;
        NameMapper::from_name(&self.column_mapper)?;

        for pattern in self.include_tables.iter().chain(&self.exclude_tables) {
            glob::Pattern::new(pattern)?;
        }

        if !self.language.is_empty() && language::lookup(&self.language).is_none() {
            return Err(ReverseError::ValidationError(format!(
                "unknown language: {}",
                self.language
            )));
        }

        for (hook, name) in [("formatter", &self.formatter), ("importter", &self.importter)] {
            if !name.is_empty() && name != defaults::NONE && language::lookup(name).is_none() {
                return Err(ReverseError::ValidationError(format!(
                    "{} names an unknown language: {}",
                    hook, name
                )));
            }
        }

        if self.template.is_none() && self.template_path.is_none() && self.language.is_empty() {
            return Err(ReverseError::ValidationError(
                "You have to indicate template / template path or a language".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
kind: reverse
name: mydb
source:
  database: ddl
  conn_str: ./schema.sql
targets:
  - type: codes
    include_tables:
      - a
      - b
    exclude_tables:
      - c
    language: golang
    output_dir: ./models
  - template: "{{ tables | length }}"
    multiple_files: true
    table_prefix: t_
    funcs:
      go_type: Type
    importer: golang
    ext_name: txt
"#;

    #[test]
    fn test_parse_yaml() {
        let config = ReverseConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.kind, "reverse");
        assert_eq!(config.name, "mydb");
        assert_eq!(config.source.database, "ddl");
        assert_eq!(config.targets.len(), 2);

        let first = &config.targets[0];
        assert_eq!(first.include_tables, vec!["a", "b"]);
        assert_eq!(first.exclude_tables, vec!["c"]);
        assert_eq!(first.language, "golang");
        assert_eq!(first.table_mapper, "snake");
        assert_eq!(first.output_dir(), PathBuf::from("./models"));
        assert!(!first.multiple_files);

        let second = &config.targets[1];
        assert_eq!(second.target_type, "codes");
        assert!(second.multiple_files);
        assert_eq!(second.table_prefix, "t_");
        assert_eq!(second.funcs.get("go_type").map(String::as_str), Some("Type"));
        assert_eq!(second.importter, "golang");
        assert_eq!(second.output_dir(), PathBuf::from("."));

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_requires_template_or_language() {
        let target = ReverseTarget::default();
        let err = target.validate().unwrap_err();
        assert!(err.to_string().contains("template / template path or a language"));
    }

    #[test]
    fn test_validation_rejects_unknown_names() {
        let target = ReverseTarget {
            language: "cobol".into(),
            ..Default::default()
        };
        assert!(target.validate().is_err());

        let target = ReverseTarget {
            language: "golang".into(),
            table_mapper: "camel".into(),
            ..Default::default()
        };
        assert!(target.validate().is_err());

        let target = ReverseTarget {
            language: "golang".into(),
            formatter: "none".into(),
            include_tables: vec!["[".into()],
            ..Default::default()
        };
        assert!(target.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_database() {
        let mut config = ReverseConfig::from_yaml_str(YAML).unwrap();
        config.source.database = "oracle".into();
        assert!(config.validate().is_err());

        config.source.database = "mysql".into();
        config.source.conn_str.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reverse.yml");
        std::fs::write(&path, YAML).unwrap();

        let config = ReverseConfig::load(&path).unwrap();
        assert_eq!(config.targets.len(), 2);
        assert!(ReverseConfig::load(&dir.path().join("missing.yml")).is_err());
    }
}
