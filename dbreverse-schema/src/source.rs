//! SchemaSource trait and source selection

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::Table;

/// Trait for anything that can describe a schema.
///
/// This abstracts over live databases and DDL files so the generator does
/// not care where the metadata came from.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Fetch every table with its columns and indexes.
    async fn tables(&self) -> Result<Vec<Table>>;

    /// Release connections held by the source.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Supported database kinds, as named in the reverse config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Database {
    MySql,
    Postgres,
    Sqlite,
    Ddl,
}

impl FromStr for Database {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Database::MySql),
            "postgres" | "postgresql" | "pgx" => Ok(Database::Postgres),
            "sqlite" | "sqlite3" => Ok(Database::Sqlite),
            "ddl" | "sql" => Ok(Database::Ddl),
            other => Err(Error::UnsupportedDatabase(other.to_string())),
        }
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Database::MySql => "mysql",
            Database::Postgres => "postgres",
            Database::Sqlite => "sqlite",
            Database::Ddl => "ddl",
        };
        f.write_str(name)
    }
}

/// Open a schema source for the given database kind and connection string.
///
/// For `sqlite` the connection string is the database file (or a `file:` URI),
/// for `ddl` the path of a SQL file.
pub async fn connect(database: &str, conn_str: &str) -> Result<Box<dyn SchemaSource>> {
    let database: Database = database.parse()?;
    debug!("Opening {} schema source", database);

    let source: Box<dyn SchemaSource> = match database {
        Database::MySql => Box::new(crate::mysql::MySqlSource::new(conn_str)?),
        Database::Postgres => Box::new(crate::postgres::PostgresSource::connect(conn_str).await?),
        Database::Sqlite => Box::new(crate::sqlite::SqliteSource::new(conn_str)),
        Database::Ddl => Box::new(crate::ddl::DdlSource::new(conn_str)),
    };
    Ok(source)
}

/// Connect and fetch all tables in one call.
pub async fn fetch_tables(database: &str, conn_str: &str) -> Result<Vec<Table>> {
    let source = connect(database, conn_str).await?;
    let tables = source.tables().await;
    let closed = source.close().await;
    let tables = tables?;
    closed?;
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_names() {
        assert_eq!("mysql".parse::<Database>().unwrap(), Database::MySql);
        assert_eq!("PostgreSQL".parse::<Database>().unwrap(), Database::Postgres);
        assert_eq!("pgx".parse::<Database>().unwrap(), Database::Postgres);
        assert_eq!("sql".parse::<Database>().unwrap(), Database::Ddl);
        assert_eq!("sqlite3".parse::<Database>().unwrap(), Database::Sqlite);
        assert_eq!(Database::Sqlite.to_string(), "sqlite");
        assert!(matches!(
            "oracle".parse::<Database>(),
            Err(Error::UnsupportedDatabase(name)) if name == "oracle"
        ));
    }

    #[tokio::test]
    async fn test_fetch_tables_from_ddl_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.sql");
        std::fs::write(&path, "CREATE TABLE a (id INTEGER); CREATE TABLE b (id INTEGER);").unwrap();

        let tables = fetch_tables("ddl", path.to_str().unwrap()).await.unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
