//! Name mappers and naming helpers shared by the template funcs

use std::fmt;
use std::str::FromStr;

use heck::{ToPascalCase, ToSnakeCase};

use crate::error::{ReverseError, Result};

/// Initialisms the gonic mapper writes fully upper-case
const COMMON_INITIALISMS: &[&str] = &[
    "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID", "IP",
    "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SSH", "TLS", "TTL", "UI", "UID",
    "UUID", "URI", "URL", "UTF8", "VM", "XML", "XSRF", "XSS",
];

/// Maps table and column names to identifiers in generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMapper {
    /// `user_info` -> `UserInfo`
    #[default]
    Snake,
    /// Name left as is
    Same,
    /// Like snake, with Go initialisms upper-cased: `user_id` -> `UserID`
    Gonic,
}

impl NameMapper {
    /// Parse a mapper name from config; empty means snake
    pub fn from_name(name: &str) -> Result<Self> {
        name.parse()
    }

    /// Map a database name to an object (type or field) name
    pub fn table_to_obj(&self, name: &str) -> String {
        match self {
            NameMapper::Snake => name.to_ascii_lowercase().to_pascal_case(),
            NameMapper::Same => name.to_string(),
            NameMapper::Gonic => name
                .split('_')
                .filter(|part| !part.is_empty())
                .map(gonic_word)
                .collect(),
        }
    }
}

fn gonic_word(part: &str) -> String {
    let upper = part.to_ascii_uppercase();
    if COMMON_INITIALISMS.contains(&upper.as_str()) {
        return upper;
    }
    let lower = part.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl FromStr for NameMapper {
    type Err = ReverseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "snake" => Ok(NameMapper::Snake),
            "same" => Ok(NameMapper::Same),
            "gonic" => Ok(NameMapper::Gonic),
            other => Err(ReverseError::ConfigError(format!(
                "unknown name mapper: {} (expected snake, same or gonic)",
                other
            ))),
        }
    }
}

impl fmt::Display for NameMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NameMapper::Snake => "snake",
            NameMapper::Same => "same",
            NameMapper::Gonic => "gonic",
        };
        f.write_str(name)
    }
}

/// Lower-case the first character: `UserInfo` -> `userInfo`
pub fn un_title(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Upper-case the whole string
pub fn upper(s: &str) -> String {
    s.to_uppercase()
}

/// Generate an enum name for a column's ENUM type
/// e.g., table "users" + column "status" -> "UsersStatus"
pub fn to_enum_name(table_name: &str, column_name: &str) -> String {
    format!(
        "{}{}",
        table_name.to_pascal_case(),
        column_name.to_pascal_case()
    )
}

/// Convert an enum value to a Rust variant name
/// Handles cases like "ACTIVE", "active", "PendingReview", "IN_PROGRESS"
pub fn to_enum_variant(value: &str) -> String {
    let value = value.trim_matches('\'').trim_matches('"');
    let variant = value.to_pascal_case();
    match variant.chars().next() {
        None => "Empty".to_string(),
        Some(c) if c.is_ascii_digit() => format!("V{}", variant),
        Some(_) => variant,
    }
}

/// Check if a name is a Rust reserved keyword
pub fn is_rust_keyword(name: &str) -> bool {
    matches!(
        name,
        "as" | "async"
            | "await"
            | "break"
            | "const"
            | "continue"
            | "crate"
            | "dyn"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "abstract"
            | "become"
            | "box"
            | "do"
            | "final"
            | "macro"
            | "override"
            | "priv"
            | "try"
            | "typeof"
            | "unsized"
            | "virtual"
            | "yield"
    )
}

/// Snake-case a column name, escaping it if it's a Rust keyword
pub fn escape_field_name(name: &str) -> String {
    let snake = name.to_snake_case();
    if is_rust_keyword(&snake) {
        format!("r#{}", snake)
    } else {
        snake
    }
}
