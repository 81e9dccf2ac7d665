use nciscan::core::io::selection::SelectionError;
use nciscan::core::io::table::TableWriteError;
use nciscan::core::params::ParamLoadError;
use nciscan::engine::config::ConfigError;
use nciscan::engine::error::EngineError;
use nciscan::workflows::analyze::FrameError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Params(#[from] ParamLoadError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Output(#[from] TableWriteError),

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

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}
