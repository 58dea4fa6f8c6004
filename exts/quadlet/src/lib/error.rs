// Copyright (c) 2022 Huawei Technologies Co.,Ltd. All rights reserved.
//
// sysMaster is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

//! Error definitions of the generator.
use snafu::prelude::*;
use std::path::PathBuf;

/// Result of the generator.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reasons a source file could not be turned into a service.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// The source file is not a valid unit file
    #[snafu(display("line {}: {}", line, what))]
    FormatError {
        /// 1-based line number
        line: usize,
        /// what is wrong
        what: String,
    },

    /// A key is missing, unknown or has an unusable value
    #[snafu(display("{}", what))]
    ValidationError {
        /// what is wrong
        what: String,
    },

    /// Unbalanced quotes in a value that holds arguments
    #[snafu(display("unbalanced quoting in '{}'", value))]
    QuotingError {
        /// the offending value
        value: String,
    },

    /// The source file could not be read
    #[snafu(display("failed to read {}: {}", path.display(), source))]
    ReadSourceError {
        /// the source file
        path: PathBuf,
        /// cause
        source: std::io::Error,
    },

    /// The service or one of its symlinks could not be written
    #[snafu(display("failed to write {}: {}", path.display(), source))]
    WriteError {
        /// the output path
        path: PathBuf,
        /// cause
        source: basic::Error,
    },
}

impl From<unit_parser::Error> for Error {
    fn from(e: unit_parser::Error) -> Error {
        match e {
            unit_parser::Error::ReadFileError { source, path } => {
                Error::ReadSourceError { path, source }
            }
            unit_parser::Error::FormatError { line, what } => Error::FormatError { line, what },
            unit_parser::Error::QuotingError { value } => Error::QuotingError { value },
            unit_parser::Error::ValueError { group, key, value } => Error::ValidationError {
                what: format!("invalid value '{}' for key {} in group {}", value, key, group),
            },
        }
    }
}
