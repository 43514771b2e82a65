//! DDL file source using sqlparser-rs

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlparser::ast::{
    ColumnOption, DataType, EnumMember, Expr, Ident, IndexColumn, IndexConstraint, ObjectName,
    PrimaryKeyConstraint, Statement, TableConstraint, UniqueConstraint,
};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use crate::error::Result;
use crate::schema::{Column, Index, IndexType, Table};
use crate::source::SchemaSource;
use crate::sql_type::parse_column_type;

/// Reads tables from a file of `CREATE TABLE` statements.
#[derive(Debug, Clone)]
pub struct DdlSource {
    path: PathBuf,
}

impl DdlSource {
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
impl SchemaSource for DdlSource {
    async fn tables(&self) -> Result<Vec<Table>> {
        debug!("Parsing DDL file {:?}", self.path);
        let sql = std::fs::read_to_string(&self.path)?;
        parse_schema(&sql)
    }
}

/// Parse a SQL schema string into table metadata
pub fn parse_schema(sql: &str) -> Result<Vec<Table>> {
    let dialect = MySqlDialect {};
    let statements = Parser::parse_sql(&dialect, sql)?;

    let mut tables = Vec::new();

    for stmt in statements {
        if let Statement::CreateTable(create_table) = stmt {
            tables.push(extract_table(&create_table));
        }
    }

    Ok(tables)
}

/// Build a table from a CREATE TABLE statement
fn extract_table(create: &sqlparser::ast::CreateTable) -> Table {
    let mut table = Table::new(extract_table_name(&create.name));
    let mut indexes = Vec::new();

    for col_def in &create.columns {
        let (column, col_unique) = extract_column(col_def);

        if col_unique {
            indexes.push(Index::new(
                format!("{}_unique", column.name),
                IndexType::Unique,
                vec![column.name.clone()],
            ));
        }

        table.add_column(column);
    }

    for constraint in &create.constraints {
        match constraint {
            TableConstraint::PrimaryKey(PrimaryKeyConstraint {
                columns: pk_cols, ..
            }) => {
                let cols: Vec<String> = pk_cols
                    .iter()
                    .map(extract_ident_from_index_column)
                    .collect();
                table.set_primary_key(&cols);
            }
            TableConstraint::Unique(UniqueConstraint {
                columns: uniq_cols,
                name,
                index_name,
                ..
            }) => {
                let cols: Vec<String> = uniq_cols
                    .iter()
                    .map(extract_ident_from_index_column)
                    .collect();
                // `UNIQUE INDEX uk (col)` names the index, `CONSTRAINT c UNIQUE` the constraint
                let idx_name = index_name
                    .as_ref()
                    .or(name.as_ref())
                    .map(extract_ident)
                    .unwrap_or_else(|| format!("{}_unique", cols.join("_")));
                indexes.push(Index::new(idx_name, IndexType::Unique, cols));
            }
            TableConstraint::Index(IndexConstraint {
                columns: idx_cols,
                name,
                ..
            }) => {
                let cols: Vec<String> = idx_cols
                    .iter()
                    .map(extract_ident_from_index_column)
                    .collect();
                let idx_name = name
                    .as_ref()
                    .map(extract_ident)
                    .unwrap_or_else(|| format!("idx_{}", cols.join("_")));
                indexes.push(Index::new(idx_name, IndexType::Index, cols));
            }
            _ => {}
        }
    }

    for index in indexes {
        table.add_index(index);
    }

    table
}

/// Build a column from its definition; the flag reports a column-level UNIQUE
fn extract_column(col_def: &sqlparser::ast::ColumnDef) -> (Column, bool) {
    let parsed = parse_column_type(&col_def.data_type.to_string());

    let mut column = Column::new(extract_ident(&col_def.name), parsed.sql_type, true);
    column.unsigned = parsed.unsigned;
    column.enum_options = extract_enum_values(&col_def.data_type).unwrap_or(parsed.enum_options);
    column.set_options = parsed.set_options;

    let mut col_is_unique = false;

    for option in &col_def.options {
        match &option.option {
            ColumnOption::NotNull => {
                column.nullable = false;
            }
            ColumnOption::Null => {
                column.nullable = true;
            }
            ColumnOption::Default(expr) => {
                column.default = Some(format!("{}", expr));
            }
            ColumnOption::PrimaryKey(_) => {
                column.is_primary_key = true;
                column.nullable = false;
            }
            ColumnOption::Unique(_) => {
                col_is_unique = true;
            }
            ColumnOption::Comment(c) => {
                column.comment = Some(c.clone());
            }
            ColumnOption::DialectSpecific(tokens) => {
                // AUTO_INCREMENT arrives as a MySQL-specific token run
                let token_str = tokens
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_uppercase();
                if token_str.contains("AUTO_INCREMENT") {
                    column.is_auto_increment = true;
                }
            }
            _ => {}
        }
    }

    (column, col_is_unique)
}

/// Extract enum values from a data type
fn extract_enum_values(data_type: &DataType) -> Option<Vec<String>> {
    match data_type {
        DataType::Enum(members, _) => Some(
            members
                .iter()
                .map(|m| match m {
                    EnumMember::Name(s) => s.clone(),
                    EnumMember::NamedValue(s, _) => s.clone(),
                })
                .collect(),
        ),
        _ => None,
    }
}

fn extract_table_name(name: &ObjectName) -> String {
    name.0
        .last()
        .and_then(|part| part.as_ident())
        .map(|ident| ident.value.clone())
        .unwrap_or_default()
}

fn extract_ident(ident: &Ident) -> String {
    ident.value.clone()
}

fn extract_ident_from_index_column(ic: &IndexColumn) -> String {
    match &ic.column.expr {
        Expr::Identifier(ident) => ident.value.clone(),
        other => format!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_table() {
        let sql = r#"
            CREATE TABLE users (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                username VARCHAR(255) NOT NULL,
                bio TEXT
            );
        "#;

        let tables = parse_schema(sql).unwrap();
        assert_eq!(tables.len(), 1);
        let users = &tables[0];
        assert_eq!(users.name, "users");
        assert_eq!(users.columns.len(), 3);
        assert_eq!(users.primary_keys, vec!["id".to_string()]);
        assert_eq!(users.auto_increment.as_deref(), Some("id"));

        let id = users.get_column("id").unwrap();
        assert!(id.is_primary_key && id.is_auto_increment && !id.nullable);

        let username = users.get_column("username").unwrap();
        assert_eq!(username.sql_type.name, "VARCHAR");
        assert_eq!(username.sql_type.length, 255);
        assert!(!username.nullable);

        assert!(users.get_column("bio").unwrap().nullable);
    }

    #[test]
    fn test_parse_indexes() {
        let sql = r#"
            CREATE TABLE posts (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                user_id BIGINT NOT NULL,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(64) UNIQUE,
                INDEX idx_user_title (user_id, title),
                UNIQUE INDEX idx_title (title)
            );
        "#;

        let tables = parse_schema(sql).unwrap();
        let posts = &tables[0];

        let composite = &posts.indexes["idx_user_title"];
        assert_eq!(composite.index_type, IndexType::Index);
        assert_eq!(composite.cols, vec!["user_id", "title"]);

        let title_idx = &posts.indexes["idx_title"];
        assert_eq!(title_idx.cols, vec!["title"]);
        assert_eq!(title_idx.index_type, IndexType::Unique);

        assert!(posts.indexes.contains_key("slug_unique"));
        let title = posts.get_column("title").unwrap();
        assert!(title.indexes.contains("idx_user_title"));
    }

    #[test]
    fn test_parse_enum_default_and_comment() {
        let sql = r#"
            CREATE TABLE items (
                id BIGINT PRIMARY KEY,
                status ENUM('ACTIVE', 'INACTIVE', 'PENDING') NOT NULL DEFAULT 'ACTIVE',
                note TEXT COMMENT 'free text',
                amount DECIMAL(10,2) NOT NULL DEFAULT 0
            );
        "#;

        let tables = parse_schema(sql).unwrap();
        let items = &tables[0];

        let status = items.get_column("status").unwrap();
        assert_eq!(status.sql_type.name.to_uppercase(), "ENUM");
        assert_eq!(status.enum_options, vec!["ACTIVE", "INACTIVE", "PENDING"]);
        assert_eq!(status.default.as_deref(), Some("'ACTIVE'"));

        let note = items.get_column("note").unwrap();
        assert_eq!(note.comment.as_deref(), Some("free text"));

        let amount = items.get_column("amount").unwrap();
        assert_eq!(amount.sql_type.length, 10);
        assert_eq!(amount.sql_type.length2, 2);
    }

    #[test]
    fn test_parse_composite_primary_key() {
        let sql = r#"
            CREATE TABLE order_items (
                order_id BIGINT NOT NULL,
                product_id BIGINT NOT NULL,
                quantity INT NOT NULL,
                PRIMARY KEY (order_id, product_id)
            );
        "#;

        let tables = parse_schema(sql).unwrap();
        let table = &tables[0];
        assert_eq!(table.primary_keys, vec!["order_id", "product_id"]);
        assert!(table.get_column("order_id").unwrap().is_primary_key);
        assert!(!table.get_column("quantity").unwrap().is_primary_key);
    }

    #[test]
    fn test_non_table_statements_are_skipped() {
        let sql = "CREATE TABLE a (id INTEGER); INSERT INTO a VALUES (1);";
        let tables = parse_schema(sql).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].columns[0].sql_type.name, "INTEGER");
    }
}
