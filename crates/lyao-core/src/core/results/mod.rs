//! Parsers for the artifacts of one archived transport run.
//!
//! A run directory holds an echo of the driver file, the density/column
//! density source file and the line-of-sight intensity table. Each has its
//! own parser; [`run::RunResult`] locates the three files and assembles them.

pub mod error;
pub mod infile;
pub mod los;
pub mod run;
pub mod source;

use error::ResultParseError;
use std::path::Path;

pub(crate) fn read_text(path: &Path) -> Result<String, ResultParseError> {
    std::fs::read_to_string(path).map_err(|source| ResultParseError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses every whitespace-separated token of `text` as a float.
/// `line` is the 1-based line number used in errors.
pub(crate) fn floats(
    file: &'static str,
    line: usize,
    expected: &'static str,
    text: &str,
) -> Result<Vec<f64>, ResultParseError> {
    text.split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| ResultParseError::invalid(file, line, expected, text))
        })
        .collect()
}
