//! Crate for parsing, querying and writing systemd-style unit files.
//! The model keeps groups and entries in file order, so a parsed unit can be
//! written back without reordering anything, and values of repeatable keys
//! are available in the order they were assigned.

pub mod error;
mod parser;
mod split;
mod unit;

/// All public interfaces for normal usage.
/// Use `use unit_parser::prelude::*;` to include.
pub mod prelude;

pub use error::{Error, Result};
pub use split::{escape_words, split_words};
pub use unit::{UnitFile, UnitGroup};
