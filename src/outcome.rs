//! Result channel used by the repository and use-case layers.
//!
//! Everything above the data sources returns an [`Outcome`]: either the
//! value or a [`Failure`] carrying a short, user-facing message. Raw
//! [`crate::Error`] values are translated once, at the repository boundary.

use std::fmt;

use thiserror::Error;

use crate::error::Error;

pub type Outcome<T> = std::result::Result<T, Failure>;

/// Category of a failure, used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Server,
    Cache,
    Network,
    Auth,
    Validation,
}

impl FailureKind {
    pub fn default_message(self) -> &'static str {
        match self {
            FailureKind::Server => "Erreur serveur",
            FailureKind::Cache => "Erreur de cache",
            FailureKind::Network => "Erreur de connexion",
            FailureKind::Auth => "Erreur d'authentification",
            FailureKind::Validation => "Données invalides",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Server => "server",
            FailureKind::Cache => "cache",
            FailureKind::Network => "network",
            FailureKind::Auth => "auth",
            FailureKind::Validation => "validation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Failure {
    kind: FailureKind,
    message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Server, message)
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Cache, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Auth, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Translate a remote-source error. Only `Server` and `Network` keep their
    /// kind; everything else is reported as a generic server failure.
    pub fn from_remote(err: &Error) -> Self {
        match err {
            Error::Server { .. } => Self::server(err.to_string()),
            Error::Network(msg) => Self::network(msg.clone()),
            _ => Self::server("Erreur inconnue"),
        }
    }

    /// Translate an error raised on an explicit cache operation (download,
    /// clear). Cache errors keep their kind on top of the remote mapping.
    pub fn from_store(err: &Error) -> Self {
        match err {
            Error::Cache(msg) => Self::cache(msg.clone()),
            Error::Io(_) | Error::Serialization(_) => Self::cache(err.to_string()),
            other => Self::from_remote(other),
        }
    }
}

impl From<FailureKind> for Failure {
    fn from(kind: FailureKind) -> Self {
        Self::new(kind, kind.default_message())
    }
}

/// Exhaustive two-armed handling of an [`Outcome`].
pub trait Fold<T> {
    fn fold<R>(self, on_failure: impl FnOnce(Failure) -> R, on_success: impl FnOnce(T) -> R) -> R;
}

impl<T> Fold<T> for Outcome<T> {
    fn fold<R>(self, on_failure: impl FnOnce(Failure) -> R, on_success: impl FnOnce(T) -> R) -> R {
        match self {
            Ok(value) => on_success(value),
            Err(failure) => on_failure(failure),
        }
    }
}
