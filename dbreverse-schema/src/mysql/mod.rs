//! MySQL schema source

mod introspect;
mod types;

pub use introspect::{MySqlSource, MySqlSourceBuilder};
pub use types::{normalize_column, quote_default};
