use thiserror::Error;

/// Everything that can go wrong outside a fetch cycle.
///
/// Fetch failures themselves never surface here; feeds turn them into
/// status and message instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Async runtime unavailable: {0}")]
    Runtime(String),
}
