//! Include/exclude table filtering

use glob::Pattern;
use tracing::debug;

use dbreverse_schema::Table;

use crate::error::Result;

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(Into::into))
        .collect()
}

/// Filter tables based on include/exclude glob patterns
///
/// Exclusion wins over inclusion, and an empty include list keeps every
/// table that is not excluded. Order is preserved.
pub fn filter_tables(tables: Vec<Table>, include: &[String], exclude: &[String]) -> Result<Vec<Table>> {
    let include = compile(include)?;
    let exclude = compile(exclude)?;

    Ok(tables
        .into_iter()
        .filter(|t| {
            if exclude.iter().any(|p| p.matches(&t.name)) {
                debug!("Excluding table {}", t.name);
                return false;
            }
            include.is_empty() || include.iter().any(|p| p.matches(&t.name))
        })
        .collect())
}
