//! Metadata structures describing a database schema

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A column type as reported by the source, with its display lengths
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlType {
    /// Type name (e.g. "VARCHAR", "INTEGER", "ENUM"); case as reported by the source
    pub name: String,

    /// First length/precision (`VARCHAR(50)` -> 50), 0 if absent
    #[serde(default)]
    pub length: u32,

    /// Second length/scale (`DECIMAL(10,2)` -> 2), 0 if absent
    #[serde(default)]
    pub length2: u32,
}

impl SqlType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length: 0,
            length2: 0,
        }
    }

    pub fn with_lengths(mut self, length: u32, length2: u32) -> Self {
        self.length = length;
        self.length2 = length2;
        self
    }

    fn upper(&self) -> String {
        self.name.to_ascii_uppercase()
    }

    /// Character and text types (including ENUM, SET and UUID)
    pub fn is_text(&self) -> bool {
        let name = self.upper();
        matches!(
            name.as_str(),
            "CHAR"
                | "NCHAR"
                | "VARCHAR"
                | "NVARCHAR"
                | "TINYTEXT"
                | "TEXT"
                | "NTEXT"
                | "MEDIUMTEXT"
                | "LONGTEXT"
                | "CLOB"
                | "ENUM"
                | "SET"
                | "UUID"
                | "SYSNAME"
        )
    }

    /// Date and time types
    pub fn is_time(&self) -> bool {
        let name = self.upper();
        matches!(
            name.as_str(),
            "DATE"
                | "DATETIME"
                | "TIME"
                | "TIMESTAMP"
                | "TIMESTAMPZ"
                | "SMALLDATETIME"
                | "YEAR"
        )
    }

    /// Binary types
    pub fn is_blob(&self) -> bool {
        let name = self.upper();
        matches!(
            name.as_str(),
            "TINYBLOB"
                | "BLOB"
                | "MEDIUMBLOB"
                | "LONGBLOB"
                | "BYTEA"
                | "BINARY"
                | "VARBINARY"
                | "UNIQUEIDENTIFIER"
        )
    }

    /// Integer, floating and fixed-point types
    pub fn is_numeric(&self) -> bool {
        let name = self.upper();
        matches!(
            name.as_str(),
            "BIT"
                | "TINYINT"
                | "SMALLINT"
                | "MEDIUMINT"
                | "INT"
                | "INTEGER"
                | "BIGINT"
                | "SERIAL"
                | "BIGSERIAL"
                | "FLOAT"
                | "REAL"
                | "DOUBLE"
                | "DECIMAL"
                | "NUMERIC"
                | "MONEY"
                | "SMALLMONEY"
        )
    }

    pub fn is_bool(&self) -> bool {
        let name = self.upper();
        name == "BOOL" || name == "BOOLEAN"
    }
}

/// Kind of a secondary index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    Index,
    Unique,
}

/// A secondary index (primary keys are tracked on the table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name, with the ORM's `IDX_<table>_`/`UQE_<table>_` prefix stripped
    pub name: String,

    #[serde(rename = "type")]
    pub index_type: IndexType,

    /// Columns in the index (in order)
    pub cols: Vec<String>,

    /// Whether the name followed the ORM naming convention
    #[serde(default)]
    pub regular: bool,
}

impl Index {
    pub fn new(name: impl Into<String>, index_type: IndexType, cols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            index_type,
            cols,
            regular: false,
        }
    }
}

/// Metadata for a column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Mapped field name, filled in by the generator's column mapper
    #[serde(default)]
    pub field_name: String,

    pub sql_type: SqlType,

    pub nullable: bool,

    #[serde(default)]
    pub is_primary_key: bool,

    #[serde(default)]
    pub is_auto_increment: bool,

    /// Unsigned numeric column (MySQL)
    #[serde(default)]
    pub unsigned: bool,

    /// Default value expression, as the source reports it
    #[serde(default)]
    pub default: Option<String>,

    /// ENUM options in declaration order
    #[serde(default)]
    pub enum_options: Vec<String>,

    /// SET options in declaration order
    #[serde(default)]
    pub set_options: Vec<String>,

    /// Names of the indexes this column belongs to
    #[serde(default)]
    pub indexes: BTreeSet<String>,

    #[serde(default)]
    pub comment: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: SqlType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable,
            ..Default::default()
        }
    }

    pub fn is_enum(&self) -> bool {
        !self.enum_options.is_empty()
    }

    pub fn is_set(&self) -> bool {
        !self.set_options.is_empty()
    }
}

/// Metadata for a database table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name
    pub name: String,

    /// Table comment (if any)
    #[serde(default)]
    pub comment: Option<String>,

    /// Columns in declaration order
    pub columns: Vec<Column>,

    /// Secondary indexes by name
    #[serde(default)]
    pub indexes: BTreeMap<String, Index>,

    /// Primary key columns (in order)
    #[serde(default)]
    pub primary_keys: Vec<String>,

    /// Name of the auto-increment column, if any
    #[serde(default)]
    pub auto_increment: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Get a column by name (case-insensitive, like the catalogs)
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Append a column, tracking primary key and auto-increment membership
    pub fn add_column(&mut self, column: Column) {
        if column.is_primary_key && !self.primary_keys.contains(&column.name) {
            self.primary_keys.push(column.name.clone());
        }
        if column.is_auto_increment {
            self.auto_increment = Some(column.name.clone());
        }
        self.columns.push(column);
    }

    /// Mark the given columns as the primary key
    pub fn set_primary_key(&mut self, cols: &[String]) {
        for name in cols {
            if let Some(col) = self.get_column_mut(name) {
                col.is_primary_key = true;
                col.nullable = false;
            }
            if !self.primary_keys.contains(name) {
                self.primary_keys.push(name.clone());
            }
        }
    }

    /// Register an index and record it on each member column
    pub fn add_index(&mut self, mut index: Index) {
        for prefix in ["IDX_", "UQE_"] {
            let orm_prefix = format!("{}{}_", prefix, self.name);
            if let Some(stripped) = index.name.strip_prefix(&orm_prefix) {
                if !stripped.is_empty() {
                    index.name = stripped.to_string();
                    index.regular = true;
                }
                break;
            }
        }

        for col_name in &index.cols {
            if let Some(col) = self.get_column_mut(col_name) {
                col.indexes.insert(index.name.clone());
            }
        }
        self.indexes.insert(index.name.clone(), index);
    }

    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.primary_keys
            .iter()
            .filter_map(|name| self.get_column(name))
            .collect()
    }

    pub fn is_primary_key_column(&self, column_name: &str) -> bool {
        self.primary_keys.iter().any(|pk| pk == column_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Table {
        let mut table = Table::new("users");
        let mut id = Column::new("id", SqlType::new("BIGINT"), false);
        id.is_primary_key = true;
        id.is_auto_increment = true;
        table.add_column(id);
        table.add_column(Column::new(
            "email",
            SqlType::new("VARCHAR").with_lengths(255, 0),
            false,
        ));
        table.add_column(Column::new("tenant_id", SqlType::new("INT"), true));
        table
    }

    #[test]
    fn test_add_column_tracks_keys() {
        let table = users();
        assert_eq!(table.primary_keys, vec!["id".to_string()]);
        assert_eq!(table.auto_increment.as_deref(), Some("id"));
        assert!(table.is_primary_key_column("id"));
        assert_eq!(table.primary_key_columns().len(), 1);
    }

    #[test]
    fn test_add_index_strips_orm_prefix() {
        let mut table = users();
        table.add_index(Index::new(
            "UQE_users_email",
            IndexType::Unique,
            vec!["email".to_string()],
        ));
        table.add_index(Index::new(
            "idx_tenant_email",
            IndexType::Index,
            vec!["tenant_id".to_string(), "email".to_string()],
        ));

        let unique = table.indexes.get("email").unwrap();
        assert!(unique.regular);
        assert_eq!(unique.index_type, IndexType::Unique);
        assert!(!table.indexes["idx_tenant_email"].regular);

        let email = table.get_column("email").unwrap();
        let names: Vec<&str> = email.indexes.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["email", "idx_tenant_email"]);
    }

    #[test]
    fn test_set_primary_key_marks_not_null() {
        let mut table = Table::new("order_items");
        table.add_column(Column::new("order_id", SqlType::new("BIGINT"), true));
        table.add_column(Column::new("product_id", SqlType::new("BIGINT"), true));
        table.set_primary_key(&["order_id".to_string(), "product_id".to_string()]);

        assert_eq!(table.primary_keys.len(), 2);
        assert!(table.columns.iter().all(|c| c.is_primary_key && !c.nullable));
    }

    #[test]
    fn test_sql_type_families() {
        assert!(SqlType::new("varchar").is_text());
        assert!(SqlType::new("DATETIME").is_time());
        assert!(SqlType::new("Blob").is_blob());
        assert!(SqlType::new("DECIMAL").is_numeric());
        assert!(SqlType::new("boolean").is_bool());
        assert!(!SqlType::new("JSON").is_text());
    }

    #[test]
    fn test_table_serializes_for_templates() {
        let table = users();
        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(value["name"], "users");
        assert_eq!(value["columns"][1]["sql_type"]["length"], 255);
        let back: Table = serde_json::from_value(value).unwrap();
        assert_eq!(back, table);
    }
}
