//! Column type string parsing shared by the catalog and DDL sources

use crate::schema::SqlType;

/// A column type string broken into its parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnType {
    pub sql_type: SqlType,
    pub unsigned: bool,
    pub enum_options: Vec<String>,
    pub set_options: Vec<String>,
}

/// Parse a column type such as `int(11) unsigned`, `decimal(10,2)`,
/// `enum('a','b')` or `timestamp(3) without time zone`.
///
/// The name keeps the case it was given in; callers normalise it if the
/// source reports lower-case names.
pub fn parse_column_type(raw: &str) -> ColumnType {
    let raw = raw.trim();
    let (base, inner, rest) = match (raw.find('('), raw.rfind(')')) {
        (Some(open), Some(close)) if close > open => {
            (&raw[..open], Some(&raw[open + 1..close]), &raw[close + 1..])
        }
        _ => (raw, None, ""),
    };

    let mut unsigned = false;
    let words: Vec<&str> = base
        .split_whitespace()
        .chain(rest.split_whitespace())
        .filter(|w| match w.to_ascii_uppercase().as_str() {
            "UNSIGNED" => {
                unsigned = true;
                false
            }
            "SIGNED" | "ZEROFILL" => false,
            _ => true,
        })
        .collect();
    let name = words.join(" ");
    let upper = name.to_ascii_uppercase();

    let mut parsed = ColumnType {
        sql_type: SqlType::new(name),
        unsigned,
        ..Default::default()
    };

    if let Some(inner) = inner {
        let quoted = inner.trim_start().starts_with('\'');
        if upper == "ENUM" && quoted {
            parsed.enum_options = split_quoted_list(inner);
        } else if upper == "SET" && quoted {
            parsed.set_options = split_quoted_list(inner);
        } else {
            let mut lens = inner.split(',').map(|l| l.trim().parse::<u32>().unwrap_or(0));
            parsed.sql_type.length = lens.next().unwrap_or(0);
            parsed.sql_type.length2 = lens.next().unwrap_or(0);
        }
    }

    parsed
}

/// Split `'a','b, c','it''s'` into `["a", "b, c", "it's"]`
pub fn split_quoted_list(list: &str) -> Vec<String> {
    let mut options = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut chars = list.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' if in_quote => {
                if chars.peek() == Some(&'\'') {
                    current.push('\'');
                    chars.next();
                } else {
                    in_quote = false;
                    options.push(std::mem::take(&mut current));
                }
            }
            '\'' => in_quote = true,
            _ if in_quote => current.push(c),
            _ => {}
        }
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lengths() {
        let t = parse_column_type("varchar(255)");
        assert_eq!(t.sql_type, SqlType::new("varchar").with_lengths(255, 0));

        let t = parse_column_type("DECIMAL(10, 2)");
        assert_eq!(t.sql_type, SqlType::new("DECIMAL").with_lengths(10, 2));

        let t = parse_column_type("TEXT");
        assert_eq!(t.sql_type, SqlType::new("TEXT"));
    }

    #[test]
    fn test_parse_unsigned() {
        let t = parse_column_type("int(11) unsigned zerofill");
        assert_eq!(t.sql_type.name, "int");
        assert_eq!(t.sql_type.length, 11);
        assert!(t.unsigned);

        let t = parse_column_type("INT UNSIGNED");
        assert_eq!(t.sql_type.name, "INT");
        assert!(t.unsigned);
    }

    #[test]
    fn test_parse_enum_and_set() {
        let t = parse_column_type("enum('DRAFT','PUBLISHED','it''s, ok')");
        assert_eq!(t.sql_type.name, "enum");
        assert_eq!(t.enum_options, vec!["DRAFT", "PUBLISHED", "it's, ok"]);
        assert_eq!(t.sql_type.length, 0);

        let t = parse_column_type("SET('a', 'b')");
        assert_eq!(t.set_options, vec!["a", "b"]);
        assert!(t.enum_options.is_empty());
    }

    #[test]
    fn test_parse_trailing_words() {
        let t = parse_column_type("timestamp(3) without time zone");
        assert_eq!(t.sql_type.name, "timestamp without time zone");
        assert_eq!(t.sql_type.length, 3);

        let t = parse_column_type("character varying(50)");
        assert_eq!(t.sql_type.name, "character varying");
        assert_eq!(t.sql_type.length, 50);
    }
}
