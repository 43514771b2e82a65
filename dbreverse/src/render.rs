//! Template rendering: the func map and the per-target generator

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use tera::{Context, Tera, Value};
use tracing::{debug, warn};

use dbreverse_schema::Table;

use crate::config::{defaults, ReverseTarget};
use crate::error::{ReverseError, Result};
use crate::language::{self, FilterFn, Formatter, Importer, Language};
use crate::naming::{self, NameMapper};
use crate::output::GeneratedFile;

const TEMPLATE_NAME: &str = "reverse";

#[derive(Clone, Copy)]
enum Func {
    Filter(FilterFn),
    Mapper(NameMapper),
}

/// Named template funcs, registered on Tera as filters
#[derive(Clone)]
pub struct FuncMap {
    funcs: BTreeMap<String, Func>,
}

impl Default for FuncMap {
    fn default() -> Self {
        Self::new()
    }
}

impl FuncMap {
    /// A map holding the funcs every template gets (`UnTitle`, `Upper`)
    pub fn new() -> Self {
        let mut map = Self {
            funcs: BTreeMap::new(),
        };
        map.insert_filter("UnTitle", un_title_filter);
        map.insert_filter("Upper", upper_filter);
        map
    }

    pub fn insert_filter(&mut self, name: &str, filter: FilterFn) {
        self.funcs.insert(name.to_string(), Func::Filter(filter));
    }

    pub fn insert_mapper(&mut self, name: &str, mapper: NameMapper) {
        self.funcs.insert(name.to_string(), Func::Mapper(mapper));
    }

    /// Make `alias` call the same func as `target`
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<()> {
        let func = self.funcs.get(target).copied().ok_or_else(|| {
            ReverseError::ConfigError(format!(
                "func alias {} refers to unknown func {}",
                alias, target
            ))
        })?;
        self.funcs.insert(alias.to_string(), func);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.funcs.keys().map(String::as_str)
    }

    fn register(&self, tera: &mut Tera) {
        for (name, func) in &self.funcs {
            match *func {
                Func::Filter(filter) => tera.register_filter(name, filter),
                Func::Mapper(mapper) => tera.register_filter(
                    name,
                    move |value: &Value, _: &HashMap<String, Value>| -> tera::Result<Value> {
                        let name = value
                            .as_str()
                            .ok_or_else(|| tera::Error::msg("name mapper expects a string"))?;
                        Ok(Value::String(mapper.table_to_obj(name)))
                    },
                ),
            }
        }
    }
}

fn un_title_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("UnTitle expects a string"))?;
    Ok(Value::String(naming::un_title(s)))
}

fn upper_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("Upper expects a string"))?;
    Ok(Value::String(naming::upper(s)))
}

/// A compiled target: template, funcs and hooks, ready to render tables
pub struct Generator {
    tera: Tera,
    formatter: Option<Formatter>,
    importer: Option<Importer>,
    ext_name: String,
    column_mapper: NameMapper,
    multiple_files: bool,
    output_dir: PathBuf,
    table_prefix: String,
}

impl Generator {
    pub fn new(target: &ReverseTarget) -> Result<Self> {
        let language = if target.language.is_empty() {
            None
        } else {
            Some(language::lookup(&target.language).ok_or_else(|| {
                ReverseError::ConfigError(format!("unknown language: {}", target.language))
            })?)
        };

        let template = if let Some(template) = &target.template {
            template.clone()
        } else if let Some(path) = &target.template_path {
            std::fs::read_to_string(path).map_err(|e| {
                ReverseError::ConfigError(format!(
                    "failed to read template {}: {}",
                    path.display(),
                    e
                ))
            })?
        } else if let Some(language) = language {
            language.template.to_string()
        } else {
            return Err(ReverseError::ValidationError(
                "You have to indicate template / template path or a language".into(),
            ));
        };

        let table_mapper = NameMapper::from_name(&target.table_mapper)?;
        let column_mapper = NameMapper::from_name(&target.column_mapper)?;

        let mut funcs = FuncMap::new();
        if let Some(language) = language {
            for (name, filter) in language.funcs {
                funcs.insert_filter(name, *filter);
            }
        }
        funcs.insert_mapper("TableMapper", table_mapper);
        funcs.insert_mapper("ColumnMapper", column_mapper);
        for (alias, func) in &target.funcs {
            funcs.alias(alias, func)?;
        }

        let formatter = resolve_hook(&target.formatter, language, |l| l.formatter)?;
        let importer = resolve_hook(&target.importter, language, |l| l.importer)?;

        let ext_name = if target.ext_name.is_empty() {
            language.map(|l| l.ext_name).unwrap_or_default()
        } else {
            target.ext_name.as_str()
        };

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        funcs.register(&mut tera);
        tera.add_raw_template(TEMPLATE_NAME, &template)?;

        debug!(
            "Compiled template (language={:?}, funcs={})",
            language.map(|l| l.name),
            funcs.names().collect::<Vec<_>>().join(",")
        );

        Ok(Self {
            tera,
            formatter,
            importer,
            ext_name: normalize_ext(ext_name),
            column_mapper,
            multiple_files: target.multiple_files,
            output_dir: target.output_dir(),
            table_prefix: target.table_prefix.clone(),
        })
    }

    /// Extension of generated files, with its leading dot
    pub fn ext_name(&self) -> &str {
        &self.ext_name
    }

    /// Render the tables into one `models` file, or one file per table
    pub fn generate(&self, tables: &[Table]) -> Result<Vec<GeneratedFile>> {
        let tables: Vec<Table> = tables.iter().cloned().map(|t| self.prepare(t)).collect();

        if !self.multiple_files {
            let path = self
                .output_dir
                .join(format!("{}{}", defaults::SINGLE_FILE_STEM, self.ext_name));
            let content = self.render(&tables)?;
            return Ok(vec![GeneratedFile::new(path, content)]);
        }

        let mut files: Vec<GeneratedFile> = Vec::with_capacity(tables.len());
        for table in &tables {
            let path = self
                .output_dir
                .join(format!("{}{}", table.name, self.ext_name));
            if files.iter().any(|f| f.path == path) {
                return Err(ReverseError::ValidationError(format!(
                    "two tables map to {} after trimming prefix {:?}",
                    path.display(),
                    self.table_prefix
                )));
            }
            let content = self.render(std::slice::from_ref(table))?;
            files.push(GeneratedFile::new(path, content));
        }
        Ok(files)
    }

    fn prepare(&self, mut table: Table) -> Table {
        if !self.table_prefix.is_empty() {
            if let Some(stripped) = table.name.strip_prefix(&self.table_prefix) {
                table.name = stripped.to_string();
            }
        }
        for column in &mut table.columns {
            column.field_name = self.column_mapper.table_to_obj(&column.name);
        }
        table
    }

    fn render(&self, tables: &[Table]) -> Result<String> {
        let imports = self.importer.map(|import| import(tables)).unwrap_or_default();

        let mut context = Context::new();
        context.insert("tables", tables);
        context.insert("imports", &imports);

        let rendered = self.tera.render(TEMPLATE_NAME, &context)?;
        debug!("Rendered {} table(s), {} bytes", tables.len(), rendered.len());

        match self.formatter {
            Some(format) => match format(&rendered) {
                Ok(formatted) => Ok(formatted),
                Err(e) => {
                    warn!("{}; keeping unformatted output", e);
                    Ok(rendered)
                }
            },
            None => Ok(rendered),
        }
    }
}

/// Pick a formatter/importer: the named language's, none, or the target language's
fn resolve_hook<T>(
    name: &str,
    language: Option<&Language>,
    pick: fn(&Language) -> Option<T>,
) -> Result<Option<T>> {
    if name.is_empty() {
        return Ok(language.and_then(pick));
    }
    if name.eq_ignore_ascii_case(defaults::NONE) {
        return Ok(None);
    }
    language::lookup(name)
        .map(pick)
        .ok_or_else(|| ReverseError::ConfigError(format!("unknown language: {}", name)))
}

fn normalize_ext(ext: &str) -> String {
    if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}
