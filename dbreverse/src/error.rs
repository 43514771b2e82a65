//! Error types for dbreverse

use thiserror::Error;

/// Result type alias for dbreverse operations
pub type Result<T> = std::result::Result<T, ReverseError>;

/// Errors that can occur while reversing a schema into source files
#[derive(Error, Debug)]
pub enum ReverseError {
    #[error("Schema source error: {0}")]
    SchemaError(#[from] dbreverse_schema::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Template error: {}", render_chain(.0))]
    TemplateError(#[from] tera::Error),

    #[error("Invalid table pattern: {0}")]
    PatternError(#[from] glob::PatternError),

    #[error("Format error: {0}")]
    FormatError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for ReverseError {
    fn from(err: config::ConfigError) -> Self {
        ReverseError::ConfigError(err.to_string())
    }
}

// tera keeps the useful part (which filter failed, and why) in the source chain
fn render_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
