//! Column type handling for MySQL catalog rows

use crate::schema::{Column, SqlType};
use crate::sql_type::parse_column_type;

/// Build a column from an `information_schema.COLUMNS` row.
///
/// `column_type` is the full `COLUMN_TYPE` (e.g. `int(10) unsigned`,
/// `enum('a','b')`). The type name is upper-cased.
pub fn normalize_column(
    name: &str,
    column_type: &str,
    nullable: bool,
    default: Option<String>,
) -> Column {
    // UNSIGNED is dropped from the name, so FLOAT UNSIGNED reads as FLOAT
    let parsed = parse_column_type(column_type);
    let sql_type = SqlType {
        name: parsed.sql_type.name.to_ascii_uppercase(),
        ..parsed.sql_type
    };

    let mut column = Column::new(name, sql_type, nullable);
    column.unsigned = parsed.unsigned;
    column.enum_options = parsed.enum_options;
    column.set_options = parsed.set_options;
    column.default = default.map(|d| quote_default(&column.sql_type, d));
    column
}

/// Quote a catalog default for text and time columns.
///
/// The catalog reports string defaults without quotes; expressions such as
/// `CURRENT_TIMESTAMP` and already-quoted values are left alone.
pub fn quote_default(sql_type: &SqlType, default: String) -> String {
    if !(sql_type.is_text() || sql_type.is_time()) {
        return default;
    }
    if default.starts_with('\'') {
        return default;
    }
    let upper = default.to_ascii_uppercase();
    if upper.starts_with("CURRENT_TIMESTAMP") || upper.starts_with("NOW(") {
        return default;
    }
    format!("'{}'", default.replace('\'', "''"))
}
