//! Configuration module for dbreverse

pub mod defaults;
mod settings;

pub use settings::*;
