use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;
use crate::core::calendar::CalendarError;
use crate::core::geometry::GeometryParseError;
use crate::core::site::SiteError;
use crate::core::timing::TimingError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid sweep configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to start '{program}': {source}", program = program.display())]
    Launch {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("'{program}' exited with {}: {stderr}", describe_exit(*code), program = program.display())]
    ProcessFailed {
        program: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Expected output '{path}' was not produced", path = path.display())]
    MissingArtifact { path: PathBuf },

    #[error("Shadow produced no geometry samples for {interval}")]
    EmptyGeometry { interval: String },

    #[error("Shadow output could not be parsed: {source}")]
    Geometry {
        #[from]
        source: GeometryParseError,
    },

    #[error(transparent)]
    Timing(#[from] TimingError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error("Location cannot be used: {0}")]
    Site(#[from] SiteError),

    #[error("I/O error on '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (killed by signal)".to_string(),
    }
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
