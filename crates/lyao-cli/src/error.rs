use lyao::core::calendar::CalendarError;
use lyao::core::results::error::ResultParseError;
use lyao::core::timing::TimingError;
use lyao::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Results(#[from] ResultParseError),

    #[error(transparent)]
    Timing(#[from] TimingError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("{failed} of {total} runs failed; see the log for details")]
    IncompleteSweep { failed: usize, total: u64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
