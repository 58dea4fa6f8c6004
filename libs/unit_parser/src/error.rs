//! Definitions for all possible errors used in this crate.
use snafu::Snafu;
use std::{io, path::PathBuf};

/// Errors used in crate.
#[derive(Debug, Snafu)]
#[allow(missing_docs)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to read file {}: {}.", path.display(), source))]
    ReadFileError { source: io::Error, path: PathBuf },

    #[snafu(display("Line {}: {}.", line, what))]
    FormatError { line: usize, what: String },

    #[snafu(display("Unbalanced quoting in '{}'.", value))]
    QuotingError { value: String },

    #[snafu(display("Invalid value '{}' of key {} in group {}.", value, key, group))]
    ValueError {
        group: String,
        key: String,
        value: String,
    },
}

/// Result of the unit parser.
pub type Result<T, E = Error> = std::result::Result<T, E>;
