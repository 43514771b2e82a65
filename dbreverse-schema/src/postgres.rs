//! PostgreSQL schema source over `tokio-postgres`

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio_postgres::types::Oid;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error};

use crate::error::Result;
use crate::schema::{Column, Index, IndexType, SqlType, Table};
use crate::source::SchemaSource;
use crate::sql_type::parse_column_type;

const TABLES_SQL: &str = "SELECT c.relname::text, COALESCE(obj_description(c.oid, 'pg_class'), '')
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE c.relkind IN ('r', 'p') AND n.nspname = current_schema()
ORDER BY c.relname";

const COLUMNS_SQL: &str = "SELECT a.attname::text,
       format_type(a.atttypid, a.atttypmod),
       NOT a.attnotnull,
       pg_get_expr(d.adbin, d.adrelid),
       EXISTS (
           SELECT 1 FROM pg_index i
           WHERE i.indrelid = c.oid AND i.indisprimary AND a.attnum = ANY(i.indkey)
       ),
       a.attidentity <> '',
       COALESCE(col_description(c.oid, a.attnum), ''),
       t.typtype = 'e',
       a.atttypid
FROM pg_attribute a
JOIN pg_class c ON c.oid = a.attrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
JOIN pg_type t ON t.oid = a.atttypid
LEFT JOIN pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
WHERE n.nspname = current_schema() AND c.relname = $1 AND a.attnum > 0 AND NOT a.attisdropped
ORDER BY a.attnum";

const ENUM_LABELS_SQL: &str = "SELECT e.enumlabel::text
FROM pg_enum e
WHERE e.enumtypid = $1
ORDER BY e.enumsortorder";

const INDEXES_SQL: &str = "SELECT ic.relname::text, ix.indisunique, a.attname::text
FROM pg_index ix
JOIN pg_class t ON t.oid = ix.indrelid
JOIN pg_class ic ON ic.oid = ix.indexrelid
JOIN pg_namespace n ON n.oid = t.relnamespace
CROSS JOIN LATERAL unnest(ix.indkey::smallint[]) WITH ORDINALITY AS k(attnum, ord)
JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
WHERE n.nspname = current_schema() AND t.relname = $1 AND NOT ix.indisprimary
ORDER BY ic.relname, k.ord";

/// Reads table metadata from the current schema of a PostgreSQL database.
pub struct PostgresSource {
    client: Client,
}

impl PostgresSource {
    /// Connect with a libpq-style or URL connection string.
    pub async fn connect(conn_str: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(conn_str, NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("postgres connection error: {e}");
            }
        });
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Labels of the enum type with this oid, in declaration order
    async fn enum_labels(&self, type_oid: Oid) -> Result<Vec<String>> {
        let rows = self.client.query(ENUM_LABELS_SQL, &[&type_oid]).await?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(Into::into))
            .collect()
    }

    async fn table(&self, name: String, comment: String) -> Result<Table> {
        let mut table = Table::new(name);
        if !comment.is_empty() {
            table.comment = Some(comment);
        }

        let rows = self.client.query(COLUMNS_SQL, &[&table.name]).await?;
        for row in &rows {
            let col_name: String = row.try_get(0)?;
            let format_type: String = row.try_get(1)?;
            let nullable: bool = row.try_get(2)?;
            let default: Option<String> = row.try_get(3)?;
            let is_primary: bool = row.try_get(4)?;
            let is_identity: bool = row.try_get(5)?;
            let comment: String = row.try_get(6)?;
            let is_enum: bool = row.try_get(7)?;
            let type_oid: Oid = row.try_get(8)?;

            let mut column = Column::new(col_name, normalize_type(&format_type), nullable);
            column.is_primary_key = is_primary;
            if is_enum {
                column.sql_type = SqlType::new("ENUM");
                column.enum_options = self.enum_labels(type_oid).await?;
            }

            match default {
                Some(d) if d.starts_with("nextval(") => column.is_auto_increment = true,
                Some(d) => column.default = Some(strip_cast(&d)),
                None => {}
            }
            if is_identity {
                column.is_auto_increment = true;
            }
            if !comment.is_empty() {
                column.comment = Some(comment);
            }
            table.add_column(column);
        }

        let rows = self.client.query(INDEXES_SQL, &[&table.name]).await?;
        let mut grouped: BTreeMap<String, Index> = BTreeMap::new();
        for row in &rows {
            let index_name: String = row.try_get(0)?;
            let unique: bool = row.try_get(1)?;
            let col_name: String = row.try_get(2)?;
            let index_type = if unique {
                IndexType::Unique
            } else {
                IndexType::Index
            };
            grouped
                .entry(index_name.clone())
                .or_insert_with(|| Index::new(index_name, index_type, Vec::new()))
                .cols
                .push(col_name);
        }
        for index in grouped.into_values() {
            table.add_index(index);
        }

        debug!(
            "Read table {} ({} columns, {} indexes)",
            table.name,
            table.columns.len(),
            table.indexes.len()
        );
        Ok(table)
    }
}

#[async_trait]
impl SchemaSource for PostgresSource {
    async fn tables(&self) -> Result<Vec<Table>> {
        let rows = self.client.query(TABLES_SQL, &[]).await?;
        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get(0)?;
            let comment: String = row.try_get(1)?;
            tables.push(self.table(name, comment).await?);
        }
        Ok(tables)
    }
}

/// Map a `format_type` string onto the ORM's type names
pub fn normalize_type(format_type: &str) -> SqlType {
    if format_type.trim_end().ends_with("[]") {
        return SqlType::new("ARRAY");
    }

    let parsed = parse_column_type(format_type).sql_type;
    let name = match parsed.name.to_ascii_lowercase().as_str() {
        "character varying" => "VARCHAR".to_string(),
        "character" => "CHAR".to_string(),
        "timestamp without time zone" | "timestamp" => "DATETIME".to_string(),
        "timestamp with time zone" => "TIMESTAMPZ".to_string(),
        "double precision" => "DOUBLE".to_string(),
        "boolean" => "BOOL".to_string(),
        "time without time zone" | "time with time zone" => "TIME".to_string(),
        "bytea" => "BLOB".to_string(),
        "oid" => "BIGINT".to_string(),
        other => other.to_ascii_uppercase(),
    };

    SqlType { name, ..parsed }
}

/// `'abc'::character varying` -> `'abc'`
fn strip_cast(default: &str) -> String {
    if default.starts_with('\'') {
        if let Some(pos) = default.rfind("'::") {
            return default[..=pos].to_string();
        }
    }
    default.to_string()
}
