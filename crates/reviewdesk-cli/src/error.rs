//! Error types for the reviewdesk CLI.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Everything a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad or missing profile configuration
    #[error("Config: {0}")]
    Config(String),

    /// The server rejected the request or could not be reached
    #[error(transparent)]
    Client(#[from] reviewdesk_client::ClientError),

    /// Reading the config or writing an export file failed
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// `--data` or an output document was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The config file is not valid TOML
    #[error("Config file is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Arguments that parse but make no sense
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Refused profile change
    #[error("Not allowed: {0}")]
    NotPermitted(String),
}
