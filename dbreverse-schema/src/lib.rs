//! dbreverse-schema - database schema metadata for code generation
//!
//! Reads table metadata (columns, types, indexes, enum/set options, comments)
//! from a live database or from a DDL file and exposes it as plain,
//! serializable structs that templates can walk.
//!
//! # Sources
//!
//! - **MySQL**: `information_schema` queries over `mysql_async`
//! - **PostgreSQL**: catalog queries over `tokio-postgres`
//! - **SQLite**: `sqlite_master` and the table pragmas over `rusqlite`
//! - **DDL**: `CREATE TABLE` statements parsed with `sqlparser` (no server needed)
//!
//! # Example
//!
//! ```ignore
//! let tables = dbreverse_schema::fetch_tables("mysql", "mysql://root@localhost/test").await?;
//! for table in &tables {
//!     println!("{} ({} columns)", table.name, table.columns.len());
//! }
//! ```

pub mod ddl;
pub mod error;
pub mod mysql;
pub mod postgres;
pub mod schema;
pub mod source;
pub mod sql_type;
pub mod sqlite;

pub use error::{Error, Result};
pub use schema::{Column, Index, IndexType, SqlType, Table};
pub use source::{connect, fetch_tables, Database, SchemaSource};
