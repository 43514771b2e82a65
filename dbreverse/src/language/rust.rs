//! Serde structs for Rust

use std::collections::HashMap;

use tera::Value;

use dbreverse_schema::{Column, Table};

use super::{column_value, push_unique, table_name_arg, FilterFn, Language};
use crate::error::{ReverseError, Result};
use crate::naming;

const TEMPLATE: &str = r#"{% for path in imports %}use {{ path }};
{% endfor %}
{% for table in tables %}{% for col in table.columns %}{% if col.enum_options %}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum {{ col | EnumName(table=table) }} {
{% for option in col.enum_options %}    #[serde(rename = {{ option | Str }})]
    {{ option | Variant }},
{% endfor %}}
{% endif %}{% endfor %}
{% if table.comment %}{{ table.comment | Doc }}
{% endif %}#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct {{ table.name | TableMapper }} {
{% for col in table.columns %}{% set field = col.name | Field %}{% if col.comment %}{{ col.comment | Doc(indent="    ") }}
{% endif %}{% if field != col.name %}    #[serde(rename = {{ col.name | Str }})]
{% endif %}    pub {{ field }}: {{ col | Type(table=table) }},
{% endfor %}}
{% endfor %}
"#;

const FUNCS: &[(&str, FilterFn)] = &[
    ("Type", type_filter),
    ("Field", field_filter),
    ("EnumName", enum_name_filter),
    ("Variant", variant_filter),
    ("Doc", doc_filter),
    ("Str", str_filter),
];

pub(super) fn language() -> Language {
    Language {
        name: "rust",
        template: TEMPLATE,
        funcs: FUNCS,
        formatter: Some(format_rust),
        importer: Some(rust_imports),
        ext_name: ".rs",
    }
}

/// Represents a Rust type for code generation
#[derive(Debug, Clone, PartialEq)]
pub enum RustType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Bytes,
    Decimal,
    NaiveDate,
    NaiveDateTime,
    NaiveTime,
    DateTimeUtc,
    Json,
    /// Generated enum type with the enum name
    Enum(String),
    /// Optional wrapper
    Option(Box<RustType>),
}

impl RustType {
    /// Get the type string for code generation
    ///
    /// Chrono and decimal types use their short names; the importer brings
    /// them into scope.
    pub fn to_type_string(&self) -> String {
        match self {
            RustType::Bool => "bool".to_string(),
            RustType::I8 => "i8".to_string(),
            RustType::I16 => "i16".to_string(),
            RustType::I32 => "i32".to_string(),
            RustType::I64 => "i64".to_string(),
            RustType::U8 => "u8".to_string(),
            RustType::U16 => "u16".to_string(),
            RustType::U32 => "u32".to_string(),
            RustType::U64 => "u64".to_string(),
            RustType::F32 => "f32".to_string(),
            RustType::F64 => "f64".to_string(),
            RustType::String => "String".to_string(),
            RustType::Bytes => "Vec<u8>".to_string(),
            RustType::Decimal => "Decimal".to_string(),
            RustType::NaiveDate => "NaiveDate".to_string(),
            RustType::NaiveDateTime => "NaiveDateTime".to_string(),
            RustType::NaiveTime => "NaiveTime".to_string(),
            RustType::DateTimeUtc => "DateTime<Utc>".to_string(),
            RustType::Json => "serde_json::Value".to_string(),
            RustType::Enum(name) => name.clone(),
            RustType::Option(inner) => format!("Option<{}>", inner.to_type_string()),
        }
    }

    /// `use` paths this type needs
    pub fn imports(&self) -> &'static [&'static str] {
        match self {
            RustType::Decimal => &["rust_decimal::Decimal"],
            RustType::NaiveDate => &["chrono::NaiveDate"],
            RustType::NaiveDateTime => &["chrono::NaiveDateTime"],
            RustType::NaiveTime => &["chrono::NaiveTime"],
            RustType::DateTimeUtc => &["chrono::DateTime", "chrono::Utc"],
            RustType::Option(inner) => inner.imports(),
            _ => &[],
        }
    }

    /// Get the inner type if this is an Option
    pub fn inner_type(&self) -> &RustType {
        match self {
            RustType::Option(inner) => inner,
            _ => self,
        }
    }

    /// Check if this is an Option type
    pub fn is_optional(&self) -> bool {
        matches!(self, RustType::Option(_))
    }
}

/// Resolve SQL column types to Rust types
pub struct TypeResolver;

impl TypeResolver {
    /// Get the Rust type for a column
    pub fn resolve(column: &Column, table_name: &str) -> RustType {
        let base_type = Self::resolve_base_type(column, table_name);

        if column.nullable {
            RustType::Option(Box::new(base_type))
        } else {
            base_type
        }
    }

    /// Resolve the base type (without Option wrapper)
    fn resolve_base_type(column: &Column, table_name: &str) -> RustType {
        if column.is_enum() {
            return RustType::Enum(naming::to_enum_name(table_name, &column.name));
        }

        let sql_type = &column.sql_type;
        let name = sql_type.name.to_ascii_uppercase();

        // TINYINT(1) and BIT(1) are MySQL's booleans
        if sql_type.is_bool() || (sql_type.length == 1 && (name == "TINYINT" || name == "BIT")) {
            return RustType::Bool;
        }

        let unsigned = column.unsigned;
        match name.as_str() {
            "TINYINT" => {
                if unsigned {
                    RustType::U8
                } else {
                    RustType::I8
                }
            }
            "SMALLINT" | "SMALLSERIAL" => {
                if unsigned {
                    RustType::U16
                } else {
                    RustType::I16
                }
            }
            "MEDIUMINT" | "INT" | "INTEGER" | "SERIAL" => {
                if unsigned {
                    RustType::U32
                } else {
                    RustType::I32
                }
            }
            "BIGINT" | "BIGSERIAL" => {
                if unsigned {
                    RustType::U64
                } else {
                    RustType::I64
                }
            }
            "FLOAT" | "REAL" => RustType::F32,
            "DOUBLE" => RustType::F64,
            "DECIMAL" | "NUMERIC" | "MONEY" | "SMALLMONEY" => RustType::Decimal,
            "DATE" => RustType::NaiveDate,
            "DATETIME" | "TIMESTAMP" | "SMALLDATETIME" => RustType::NaiveDateTime,
            "TIMESTAMPZ" => RustType::DateTimeUtc,
            "TIME" => RustType::NaiveTime,
            "YEAR" => RustType::I16,
            "JSON" | "JSONB" => RustType::Json,
            "BIT" => RustType::Bytes,
            // Spatial types are read as raw bytes
            "GEOMETRY" | "POINT" | "LINESTRING" | "POLYGON" | "MULTIPOINT" | "MULTILINESTRING"
            | "MULTIPOLYGON" | "GEOMETRYCOLLECTION" => RustType::Bytes,
            _ if sql_type.is_blob() => RustType::Bytes,
            _ => RustType::String,
        }
    }
}

fn type_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let column = column_value(value)?;
    let table_name = table_name_arg(args)?;
    Ok(Value::String(
        TypeResolver::resolve(&column, &table_name).to_type_string(),
    ))
}

fn field_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let name = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("Field expects a column name"))?;
    Ok(Value::String(naming::escape_field_name(name)))
}

fn enum_name_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let column_name = match value {
        Value::String(name) => name.clone(),
        other => column_value(other)?.name,
    };
    let table_name = table_name_arg(args)?;
    Ok(Value::String(naming::to_enum_name(&table_name, &column_name)))
}

fn variant_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let option = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("Variant expects an enum option"))?;
    Ok(Value::String(naming::to_enum_variant(option)))
}

/// `///` doc comment lines for a catalog comment, which may span lines
fn doc_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("Doc expects a comment"))?;
    let indent = args.get("indent").and_then(Value::as_str).unwrap_or("");
    Ok(Value::String(doc_lines(text, indent)))
}

fn doc_lines(text: &str, indent: &str) -> String {
    // a bare CR is not allowed inside a doc comment
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    text.lines()
        .map(|line| format!("{}/// {}", indent, line).trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A quoted, escaped Rust string literal
fn str_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("Str expects a string"))?;
    Ok(Value::String(format!("{:?}", s)))
}

/// serde first, then the chrono/decimal types the columns use
pub fn rust_imports(tables: &[Table]) -> Vec<String> {
    let mut imports = vec!["serde::{Deserialize, Serialize}".to_string()];
    for table in tables {
        for column in &table.columns {
            for path in TypeResolver::resolve(column, &table.name).imports() {
                push_unique(&mut imports, path);
            }
        }
    }
    imports
}

/// Pretty-print with prettyplease; fails if the source does not parse
pub fn format_rust(src: &str) -> Result<String> {
    let file = syn::parse_file(src)
        .map_err(|e| ReverseError::FormatError(format!("generated Rust does not parse: {}", e)))?;
    Ok(prettyplease::unparse(&file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbreverse_schema::SqlType;

    fn make_column(name: &str, sql_type: SqlType, nullable: bool, unsigned: bool) -> Column {
        let mut column = Column::new(name, sql_type, nullable);
        column.unsigned = unsigned;
        column
    }

    #[test]
    fn test_integer_types() {
        let col = make_column("id", SqlType::new("BIGINT"), false, false);
        assert_eq!(TypeResolver::resolve(&col, "users"), RustType::I64);

        let col = make_column("id", SqlType::new("BIGINT"), false, true);
        assert_eq!(TypeResolver::resolve(&col, "users"), RustType::U64);

        let col = make_column("count", SqlType::new("int"), false, false);
        assert_eq!(TypeResolver::resolve(&col, "users"), RustType::I32);

        let col = make_column("n", SqlType::new("TINYINT").with_lengths(4, 0), false, true);
        assert_eq!(TypeResolver::resolve(&col, "users"), RustType::U8);
    }

    #[test]
    fn test_boolean_type() {
        let col = make_column("active", SqlType::new("TINYINT").with_lengths(1, 0), false, false);
        assert_eq!(TypeResolver::resolve(&col, "users"), RustType::Bool);

        let col = make_column("flag", SqlType::new("BOOL"), false, false);
        assert_eq!(TypeResolver::resolve(&col, "users"), RustType::Bool);

        let col = make_column("mask", SqlType::new("BIT").with_lengths(8, 0), false, false);
        assert_eq!(TypeResolver::resolve(&col, "users"), RustType::Bytes);
    }

    #[test]
    fn test_datetime_types() {
        let col = make_column("created_at", SqlType::new("DATETIME"), true, false);
        assert_eq!(
            TypeResolver::resolve(&col, "users"),
            RustType::Option(Box::new(RustType::NaiveDateTime))
        );

        let col = make_column("birth_date", SqlType::new("DATE"), false, false);
        assert_eq!(TypeResolver::resolve(&col, "users"), RustType::NaiveDate);

        let col = make_column("seen_at", SqlType::new("TIMESTAMPZ"), false, false);
        assert_eq!(
            TypeResolver::resolve(&col, "users").to_type_string(),
            "DateTime<Utc>"
        );
    }

    #[test]
    fn test_enum_type() {
        let mut col = make_column("status", SqlType::new("ENUM"), false, false);
        col.enum_options = vec!["ACTIVE".to_string(), "INACTIVE".to_string()];
        assert_eq!(
            TypeResolver::resolve(&col, "users"),
            RustType::Enum("UsersStatus".to_string())
        );
    }

    #[test]
    fn test_type_string() {
        assert_eq!(RustType::I64.to_type_string(), "i64");
        assert_eq!(
            RustType::Option(Box::new(RustType::String)).to_type_string(),
            "Option<String>"
        );
        assert_eq!(RustType::Json.to_type_string(), "serde_json::Value");
        assert!(RustType::Option(Box::new(RustType::Bytes)).is_optional());
        assert_eq!(
            RustType::Option(Box::new(RustType::Decimal)).inner_type(),
            &RustType::Decimal
        );
    }

    #[test]
    fn test_rust_imports() {
        let mut users = Table::new("users");
        users.add_column(make_column("balance", SqlType::new("DECIMAL"), true, false));
        users.add_column(make_column("created_at", SqlType::new("DATETIME"), false, false));
        let mut events = Table::new("events");
        events.add_column(make_column("at", SqlType::new("DATETIME"), false, false));
        events.add_column(make_column("seen", SqlType::new("TIMESTAMPZ"), false, false));

        assert_eq!(
            rust_imports(&[users, events]),
            vec![
                "serde::{Deserialize, Serialize}",
                "rust_decimal::Decimal",
                "chrono::NaiveDateTime",
                "chrono::DateTime",
                "chrono::Utc",
            ]
        );
        assert_eq!(rust_imports(&[]), vec!["serde::{Deserialize, Serialize}"]);
    }

    #[test]
    fn test_filters() {
        let args = HashMap::from([("table".to_string(), Value::String("users".into()))]);

        let field = field_filter(&Value::String("type".into()), &HashMap::new()).unwrap();
        assert_eq!(field, Value::String("r#type".into()));

        let name = enum_name_filter(&Value::String("status".into()), &args).unwrap();
        assert_eq!(name, Value::String("UsersStatus".into()));

        let variant = variant_filter(&Value::String("PENDING_REVIEW".into()), &args).unwrap();
        assert_eq!(variant, Value::String("PendingReview".into()));

        let column = make_column("score", SqlType::new("DOUBLE"), true, false);
        let ty = type_filter(&serde_json::to_value(&column).unwrap(), &args).unwrap();
        assert_eq!(ty, Value::String("Option<f64>".into()));
    }

    #[test]
    fn test_doc_and_str_filters() {
        assert_eq!(doc_lines("one line", ""), "/// one line");
        assert_eq!(
            doc_lines("first line\r\n\nsecond line\rthird", "    "),
            "    /// first line\n    ///\n    /// second line\n    /// third"
        );

        let literal = str_filter(&Value::String(r#"12" in\ch"#.into()), &HashMap::new()).unwrap();
        assert_eq!(literal, Value::String(r#""12\" in\\ch""#.into()));
        let parsed: syn::LitStr = syn::parse_str(literal.as_str().unwrap()).unwrap();
        assert_eq!(parsed.value(), r#"12" in\ch"#);
    }

    #[test]
    fn test_template_escapes_catalog_text() {
        let target = crate::config::ReverseTarget {
            language: "rust".into(),
            ..Default::default()
        };

        let mut media = Table::new("media");
        media.comment = Some("uploaded files\nsecond line".into());
        let mut size = make_column("size", SqlType::new("ENUM"), false, false);
        size.enum_options = vec![r#"12" inch"#.into(), r#"back\slash"#.into()];
        media.add_column(size);
        let mut body = make_column("body", SqlType::new("TEXT"), false, false);
        body.comment = Some("first line\nsecond line".into());
        media.add_column(body);
        media.add_column(make_column(r#"odd"name"#, SqlType::new("INT"), true, false));

        let files = crate::render::Generator::new(&target)
            .unwrap()
            .generate(&[media])
            .unwrap();
        let code = &files[0].content;

        // the formatter only succeeds on valid Rust
        assert!(syn::parse_file(code).is_ok());
        assert!(code.contains(r#"#[serde(rename = "12\" inch")]"#));
        assert!(code.contains("V12Inch,"));
        assert!(code.contains(r#"#[serde(rename = "back\\slash")]"#));
        assert!(code.contains("/// uploaded files\n/// second line\n"));
        assert!(code.contains("    /// first line\n    /// second line\n    pub body: String,"));
        assert!(code.contains(r#"#[serde(rename = "odd\"name")]"#));
    }

    #[test]
    fn test_format_rust() {
        let formatted = format_rust("pub struct A{pub id:i64,}").unwrap();
        assert_eq!(formatted, "pub struct A {\n    pub id: i64,\n}\n");
        assert!(format_rust("pub struct {").is_err());
    }
}
