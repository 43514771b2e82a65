//! Default configuration values - single source of truth

/// Expected `kind` of a reverse configuration
pub const KIND: &str = "reverse";

/// Default target type
pub const TARGET_TYPE: &str = "codes";

/// Default table and column mapper
pub const MAPPER: &str = "snake";

/// Default output directory
pub const OUTPUT_DIR: &str = ".";

/// File stem used when all tables render into one file
pub const SINGLE_FILE_STEM: &str = "models";

/// Config file read by the CLI when `-f` is not given
pub const CONFIG_FILE: &str = "custom.yml";

/// Prefix for environment overrides (`DBREVERSE_SOURCE__CONN_STR`)
pub const ENV_PREFIX: &str = "DBREVERSE";

/// Formatter/importer name that disables the hook
pub const NONE: &str = "none";
