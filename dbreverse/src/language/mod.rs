//! Built-in target languages
//!
//! A language bundles a default template, the template funcs (Tera filters)
//! that template relies on, an optional formatter, an optional import
//! generator and the extension of the files it produces. Languages are
//! registered once and looked up by name.

pub mod golang;
pub mod rust;

use std::collections::HashMap;
use std::sync::OnceLock;

use tera::Value;

use dbreverse_schema::{Column, Table};

use crate::error::Result;

/// A template filter: the piped value plus named arguments
pub type FilterFn = fn(&Value, &HashMap<String, Value>) -> tera::Result<Value>;

/// Rewrites rendered source into its canonical layout
pub type Formatter = fn(&str) -> Result<String>;

/// Lists the imports the given tables need
pub type Importer = fn(&[Table]) -> Vec<String>;

/// Describes how to generate code for one target language
#[derive(Clone, Copy)]
pub struct Language {
    pub name: &'static str,
    pub template: &'static str,
    pub funcs: &'static [(&'static str, FilterFn)],
    pub formatter: Option<Formatter>,
    pub importer: Option<Importer>,
    pub ext_name: &'static str,
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name)
            .field(
                "funcs",
                &self.funcs.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            )
            .field("formatter", &self.formatter.is_some())
            .field("importer", &self.importer.is_some())
            .field("ext_name", &self.ext_name)
            .finish()
    }
}

static LANGUAGES: OnceLock<HashMap<&'static str, Language>> = OnceLock::new();

fn registry() -> &'static HashMap<&'static str, Language> {
    LANGUAGES.get_or_init(|| {
        let mut languages = HashMap::new();
        for language in [golang::language(), rust::language()] {
            languages.insert(language.name, language);
        }
        languages
    })
}

/// Look up a registered language by name (`go` and `rs` are accepted too)
pub fn lookup(name: &str) -> Option<&'static Language> {
    let name = name.trim().to_ascii_lowercase();
    let name = match name.as_str() {
        "go" => "golang",
        "rs" => "rust",
        other => other,
    };
    registry().get(name)
}

/// All registered languages, sorted by name
pub fn languages() -> Vec<&'static Language> {
    let mut all: Vec<_> = registry().values().collect();
    all.sort_by_key(|l| l.name);
    all
}

/// Decode the column a filter was applied to
pub(crate) fn column_value(value: &Value) -> tera::Result<Column> {
    serde_json::from_value(value.clone())
        .map_err(|e| tera::Error::msg(format!("expected a column, got {}: {}", value, e)))
}

/// Decode the `table` argument of a filter
pub(crate) fn table_arg(args: &HashMap<String, Value>) -> tera::Result<Table> {
    let value = args
        .get("table")
        .ok_or_else(|| tera::Error::msg("missing `table` argument"))?;
    serde_json::from_value(value.clone())
        .map_err(|e| tera::Error::msg(format!("`table` must be a table: {}", e)))
}

/// The `table` argument's name; a plain string is accepted as the name itself
pub(crate) fn table_name_arg(args: &HashMap<String, Value>) -> tera::Result<String> {
    match args.get("table") {
        Some(Value::String(name)) => Ok(name.clone()),
        Some(Value::Object(table)) => table
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| tera::Error::msg("`table` has no name")),
        Some(other) => Err(tera::Error::msg(format!(
            "`table` must be a table or a name, got {}",
            other
        ))),
        None => Err(tera::Error::msg("missing `table` argument")),
    }
}

/// Push `item` unless it is already present, keeping first-use order
pub(crate) fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|i| i == item) {
        list.push(item.to_string());
    }
}
