use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResultParseError {
    #[error("Failed to read '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{file}: expected at least {expected} lines, found {found}")]
    TooShort {
        file: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{file} line {line}: expected {expected}, found '{found}'")]
    InvalidLine {
        file: &'static str,
        line: usize,
        expected: &'static str,
        found: String,
    },
    #[error("{file}: section header '{header}' not found")]
    MissingSection {
        file: &'static str,
        header: &'static str,
    },
    #[error("{file} line {line}: section header '{header}' appears more than once")]
    DuplicateSection {
        file: &'static str,
        line: usize,
        header: &'static str,
    },
    #[error("{file}: section '{header}' needs {expected} lines, file ends after {found}")]
    TruncatedSection {
        file: &'static str,
        header: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{file}: zone blocks differ in length (altitude {altitudes}, H {hydrogen}, O2 {oxygen}, T {temperature})")]
    ZoneLengthMismatch {
        file: &'static str,
        altitudes: usize,
        hydrogen: usize,
        oxygen: usize,
        temperature: usize,
    },
    #[error("No {role} file found under '{dir}'", dir = dir.display())]
    MissingArtifact { role: &'static str, dir: PathBuf },
    #[error("More than one {role} file under '{dir}': '{first}' and '{second}'", dir = dir.display(), first = first.display(), second = second.display())]
    AmbiguousArtifact {
        role: &'static str,
        dir: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("Failed to walk '{dir}': {source}", dir = dir.display())]
    Walk {
        dir: PathBuf,
        source: walkdir::Error,
    },
}

impl ResultParseError {
    pub(crate) fn invalid(
        file: &'static str,
        line: usize,
        expected: &'static str,
        found: &str,
    ) -> Self {
        Self::InvalidLine {
            file,
            line,
            expected,
            found: found.trim_end().to_string(),
        }
    }
}
