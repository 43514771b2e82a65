//! SQLite schema source over `rusqlite`

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::{Error, Result};
use crate::mysql::normalize_column;
use crate::schema::{Index, IndexType, Table};
use crate::source::SchemaSource;

const TABLES_SQL: &str = "SELECT name, COALESCE(sql, '') FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
     ORDER BY name";

const COLUMNS_SQL: &str = "SELECT name, type, \"notnull\", dflt_value, pk \
     FROM pragma_table_info(?1) ORDER BY cid";

const INDEXES_SQL: &str = "SELECT name, \"unique\", origin \
     FROM pragma_index_list(?1) ORDER BY name";

const INDEX_COLUMNS_SQL: &str = "SELECT name FROM pragma_index_info(?1) ORDER BY seqno";

/// Reads table metadata from a SQLite database file, opened read-only.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    path: PathBuf,
}

impl SqliteSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SchemaSource for SqliteSource {
    async fn tables(&self) -> Result<Vec<Table>> {
        debug!("Opening SQLite database {:?}", self.path);
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open_with_flags(
                &path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_tables(&conn)
        })
        .await
        .map_err(|e| Error::Introspection(format!("sqlite reader task failed: {e}")))?
    }
}

/// Read every user table from an open connection
pub fn read_tables(conn: &Connection) -> Result<Vec<Table>> {
    let mut stmt = conn.prepare(TABLES_SQL)?;
    let names = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    names
        .into_iter()
        .map(|(name, create_sql)| read_table(conn, name, &create_sql))
        .collect()
}

fn read_table(conn: &Connection, name: String, create_sql: &str) -> Result<Table> {
    let mut table = Table::new(name);

    let mut stmt = conn.prepare(COLUMNS_SQL)?;
    let rows = stmt
        .query_map([table.name.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut keys: Vec<(i64, String)> = Vec::new();
    for (col_name, declared, not_null, default, pk) in rows {
        // a column without a declared type has BLOB affinity
        let declared = if declared.trim().is_empty() {
            "BLOB"
        } else {
            declared.as_str()
        };
        let mut column = normalize_column(&col_name, declared, !not_null, None);
        column.default = default;
        if pk > 0 {
            keys.push((pk, col_name));
        }
        table.add_column(column);
    }
    keys.sort();
    let keys: Vec<String> = keys.into_iter().map(|(_, name)| name).collect();
    table.set_primary_key(&keys);

    // AUTOINCREMENT is only legal on a single INTEGER PRIMARY KEY
    if keys.len() == 1 && create_sql.to_ascii_uppercase().contains("AUTOINCREMENT") {
        if let Some(column) = table.get_column_mut(&keys[0]) {
            if column.sql_type.name == "INTEGER" {
                column.is_auto_increment = true;
                table.auto_increment = Some(keys[0].clone());
            }
        }
    }

    let mut stmt = conn.prepare(INDEXES_SQL)?;
    let indexes = stmt
        .query_map([table.name.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, bool>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut cols_stmt = conn.prepare(INDEX_COLUMNS_SQL)?;
    for (index_name, unique, origin) in indexes {
        if origin == "pk" {
            continue;
        }
        // expression key parts have no column name
        let cols: Vec<String> = cols_stmt
            .query_map([index_name.as_str()], |row| row.get::<_, Option<String>>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();
        if cols.is_empty() {
            continue;
        }
        let index_type = if unique {
            IndexType::Unique
        } else {
            IndexType::Index
        };
        table.add_index(Index::new(index_name, index_type, cols));
    }

    debug!(
        "Read table {} ({} columns, {} indexes)",
        table.name,
        table.columns.len(),
        table.indexes.len()
    );
    Ok(table)
}
