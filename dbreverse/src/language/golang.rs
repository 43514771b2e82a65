//! Go structs with xorm tags

use std::collections::HashMap;
use std::io::Write;
use std::process::{Command, Stdio};

use tera::Value;

use dbreverse_schema::{Column, IndexType, Table};

use super::{column_value, push_unique, table_arg, FilterFn, Language};
use crate::error::{ReverseError, Result};

const TEMPLATE: &str = r#"package models

{% if imports %}import (
{% for path in imports %}	"{{ path }}"
{% endfor %})
{% endif %}
{% for table in tables %}
type {{ table.name | TableMapper }} struct {
{% for col in table.columns %}	{{ col.name | ColumnMapper }}	{{ col | Type }} `{{ col | Tag(table=table) }}`
{% endfor %}}
{% endfor %}
"#;

const FUNCS: &[(&str, FilterFn)] = &[("Type", type_filter), ("Tag", tag_filter)];

pub(super) fn language() -> Language {
    Language {
        name: "golang",
        template: TEMPLATE,
        funcs: FUNCS,
        formatter: Some(format_go),
        importer: Some(go_imports),
        ext_name: ".go",
    }
}

/// Go type for a column's SQL type
pub fn go_type(column: &Column) -> &'static str {
    let sql_type = &column.sql_type;
    match sql_type.name.to_ascii_uppercase().as_str() {
        "BIT" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "SERIAL" => "int",
        "BIGINT" | "BIGSERIAL" => "int64",
        "FLOAT" | "REAL" => "float32",
        "DOUBLE" => "float64",
        _ if sql_type.is_bool() => "bool",
        _ if sql_type.is_blob() => "[]byte",
        _ if sql_type.is_time() => "time.Time",
        _ => "string",
    }
}

/// Contents of the `xorm:"..."` struct tag for a column
pub fn xorm_tag(table: &Table, column: &Column) -> String {
    let is_id_pk = column.field_name == "Id" && go_type(column) == "int64";

    let mut res: Vec<String> = Vec::new();
    if !column.nullable && !is_id_pk {
        res.push("not null".into());
    }
    if column.is_primary_key {
        res.push("pk".into());
    }
    if let Some(default) = column.default.as_deref().filter(|d| !d.is_empty()) {
        res.push(format!("default {}", default));
    }
    if column.is_auto_increment {
        res.push("autoincr".into());
    }
    if let Some(comment) = column.comment.as_deref().filter(|c| !c.is_empty()) {
        res.push(format!("comment('{}')", comment));
    }

    // column.indexes is a BTreeSet, already sorted
    for name in &column.indexes {
        let Some(index) = table.indexes.get(name) else {
            continue;
        };
        let mut kind = match index.index_type {
            IndexType::Unique => "unique".to_string(),
            IndexType::Index => "index".to_string(),
        };
        if index.cols.len() > 1 {
            kind.push_str(&format!("({})", index.name));
        }
        res.push(kind);
    }

    let sql_type = &column.sql_type;
    let mut type_str = sql_type.name.clone();
    if sql_type.length != 0 {
        if sql_type.length2 != 0 {
            type_str.push_str(&format!("({},{})", sql_type.length, sql_type.length2));
        } else {
            type_str.push_str(&format!("({})", sql_type.length));
        }
    } else if column.is_enum() {
        type_str.push_str(&quoted_options(&column.enum_options));
    } else if column.is_set() {
        type_str.push_str(&quoted_options(&column.set_options));
    }
    res.push(type_str);

    format!("xorm:\"{}\"", res.join(" "))
}

fn quoted_options(options: &[String]) -> String {
    let mut sorted: Vec<&String> = options.iter().collect();
    sorted.sort();
    let quoted: Vec<String> = sorted.iter().map(|o| format!("'{}'", o)).collect();
    format!("({})", quoted.join(","))
}

fn type_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let column = column_value(value)?;
    Ok(Value::String(go_type(&column).to_string()))
}

fn tag_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let column = column_value(value)?;
    let table = table_arg(args)?;
    Ok(Value::String(xorm_tag(&table, &column)))
}

/// `time` when any column maps to `time.Time`
pub fn go_imports(tables: &[Table]) -> Vec<String> {
    let mut imports = Vec::new();
    for column in tables.iter().flat_map(|t| &t.columns) {
        if go_type(column) == "time.Time" {
            push_unique(&mut imports, "time");
        }
    }
    imports
}

/// Run the source through `gofmt`
pub fn format_go(src: &str) -> Result<String> {
    let mut child = Command::new("gofmt")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ReverseError::FormatError(format!("failed to run gofmt: {}", e)))?;

    // gofmt reads all of stdin before writing anything
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(src.as_bytes())?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(ReverseError::FormatError(format!(
            "gofmt: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| ReverseError::FormatError(format!("gofmt produced invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbreverse_schema::{Index, SqlType};

    fn col(name: &str, sql_type: SqlType, nullable: bool) -> Column {
        Column::new(name, sql_type, nullable)
    }

    #[test]
    fn test_go_type() {
        assert_eq!(go_type(&col("a", SqlType::new("INT"), false)), "int");
        assert_eq!(go_type(&col("a", SqlType::new("bigint"), false)), "int64");
        assert_eq!(go_type(&col("a", SqlType::new("REAL"), false)), "float32");
        assert_eq!(go_type(&col("a", SqlType::new("DOUBLE"), false)), "float64");
        assert_eq!(go_type(&col("a", SqlType::new("BLOB"), false)), "[]byte");
        assert_eq!(go_type(&col("a", SqlType::new("BOOL"), false)), "bool");
        assert_eq!(go_type(&col("a", SqlType::new("DATETIME"), false)), "time.Time");
        assert_eq!(go_type(&col("a", SqlType::new("DECIMAL"), false)), "string");
        assert_eq!(go_type(&col("a", SqlType::new("GEOMETRY"), false)), "string");
    }

    #[test]
    fn test_tag_id_primary_key() {
        let mut id = col("id", SqlType::new("BIGINT").with_lengths(20, 0), false);
        id.field_name = "Id".into();
        id.is_primary_key = true;
        id.is_auto_increment = true;
        let table = Table::new("users");

        assert_eq!(xorm_tag(&table, &id), r#"xorm:"pk autoincr BIGINT(20)""#);

        id.field_name = "ID".into();
        assert_eq!(
            xorm_tag(&table, &id),
            r#"xorm:"not null pk autoincr BIGINT(20)""#
        );
    }

    #[test]
    fn test_tag_default_comment_and_indexes() {
        let mut table = Table::new("users");
        let mut email = col("email", SqlType::new("VARCHAR").with_lengths(255, 0), false);
        email.default = Some("''".into());
        email.comment = Some("login".into());
        table.add_column(email);
        table.add_column(col("tenant", SqlType::new("INT"), true));
        table.add_index(Index::new("uk_email", IndexType::Unique, vec!["email".into()]));
        table.add_index(Index::new(
            "idx_tenant_email",
            IndexType::Index,
            vec!["tenant".into(), "email".into()],
        ));

        let email = table.get_column("email").unwrap();
        assert_eq!(
            xorm_tag(&table, email),
            r#"xorm:"not null default '' comment('login') index(idx_tenant_email) unique VARCHAR(255)""#
        );

        let tenant = table.get_column("tenant").unwrap();
        assert_eq!(xorm_tag(&table, tenant), r#"xorm:"index(idx_tenant_email) INT""#);
    }

    #[test]
    fn test_tag_enum_and_set_options_sorted() {
        let table = Table::new("t");
        let mut status = col("status", SqlType::new("ENUM"), true);
        status.enum_options = vec!["on".into(), "off".into()];
        assert_eq!(xorm_tag(&table, &status), r#"xorm:"ENUM('off','on')""#);

        let mut flags = col("flags", SqlType::new("SET"), true);
        flags.set_options = vec!["b".into(), "a".into()];
        assert_eq!(xorm_tag(&table, &flags), r#"xorm:"SET('a','b')""#);

        let price = col("price", SqlType::new("DECIMAL").with_lengths(10, 2), true);
        assert_eq!(xorm_tag(&table, &price), r#"xorm:"DECIMAL(10,2)""#);
    }

    #[test]
    fn test_go_imports() {
        let mut a = Table::new("a");
        a.add_column(col("created", SqlType::new("DATETIME"), false));
        a.add_column(col("updated", SqlType::new("TIMESTAMP"), false));
        let mut b = Table::new("b");
        b.add_column(col("id", SqlType::new("INT"), false));

        assert_eq!(go_imports(&[a.clone(), b.clone()]), vec!["time"]);
        assert!(go_imports(&[b]).is_empty());
    }

    #[test]
    fn test_filters_decode_template_values() {
        let mut table = Table::new("users");
        table.add_column(col("name", SqlType::new("VARCHAR").with_lengths(64, 0), false));
        let value = serde_json::to_value(&table).unwrap();

        let ty = type_filter(&value["columns"][0], &HashMap::new()).unwrap();
        assert_eq!(ty, Value::String("string".into()));

        let mut args = HashMap::new();
        args.insert("table".to_string(), value.clone());
        let tag = tag_filter(&value["columns"][0], &args).unwrap();
        assert_eq!(tag, Value::String(r#"xorm:"not null VARCHAR(64)""#.into()));

        assert!(tag_filter(&value["columns"][0], &HashMap::new()).is_err());
    }
}
