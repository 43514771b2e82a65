//! Error types for dbreverse-schema

use thiserror::Error;

/// Result type alias for schema introspection
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading schema metadata
#[derive(Error, Debug)]
pub enum Error {
    /// MySQL driver error
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// PostgreSQL driver error
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// SQLite driver error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// DDL could not be parsed
    #[error("Failed to parse SQL schema: {0}")]
    Parse(String),

    /// IO error (reading DDL files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database name in the config is not one we can read
    #[error("Unsupported database: {0}")]
    UnsupportedDatabase(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Catalog returned something we could not interpret
    #[error("Introspection error: {0}")]
    Introspection(String),
}

impl From<sqlparser::parser::ParserError> for Error {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        Error::Parse(err.to_string())
    }
}
