use thiserror::Error;

use crate::outcome::Failure;

pub type Result<T> = std::result::Result<T, Error>;
pub type ConfigError = Error;

/// Errors raised by the data-source layer (HTTP client, cache store, config).
///
/// These never reach a use case directly: the repository translates them
/// into a [`crate::outcome::Failure`] at its boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP {status}: {reason}")]
    Server { status: u16, reason: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid: {0}")]
    Invalid(String),

    /// A repository outcome that failed, carried up to the binary.
    #[error("{0}")]
    Failed(Failure),
}

impl From<Failure> for Error {
    fn from(failure: Failure) -> Self {
        Error::Failed(failure)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl Error {
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Server { .. } => "SERVER",
            Error::Network(_) => "NETWORK",
            Error::Cache(_) => "CACHE",
            Error::Io(_) => "IO_ERROR",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Config(_) => "CONFIG",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Invalid(_) => "INVALID",
            Error::Failed(_) => "FAILURE",
        }
    }
}
