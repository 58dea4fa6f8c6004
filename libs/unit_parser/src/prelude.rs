//! Commonly used types and functions.
pub use crate::error::{Error, Result};
pub use crate::split::{escape_words, split_words};
pub use crate::unit::{UnitFile, UnitGroup};
