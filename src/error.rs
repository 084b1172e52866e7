use std::{fmt, io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProbeError>;

/// Pipeline stage that issued a request to the identity or session services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Authentication,
    SessionCreate,
    SessionUpdate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Authentication => "authentication",
            Stage::SessionCreate => "session creation",
            Stage::SessionUpdate => "session update",
        };
        f.write_str(label)
    }
}

/// Errors that abort a run for one (microservice, environment) pair.
///
/// Failures of individual endpoint calls never surface here; the runner turns
/// them into error records and keeps going.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no configuration found at {}", .path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("missing required settings: {}", .keys.join(", "))]
    MissingSettings { keys: Vec<String> },

    #[error("invalid value for {key}: {message}")]
    InvalidSetting { key: String, message: String },

    #[error("{stage} request to {url} failed with HTTP {status}: {body}")]
    Http {
        stage: Stage,
        url: String,
        status: u16,
        body: String,
    },

    #[error("authentication response from {url} did not contain an access_token")]
    MissingCredential { url: String },

    #[error("session response from {url} did not contain `{field}`")]
    MissingSession { url: String, field: &'static str },

    #[error("{stage} request to {url} could not be completed: {source}")]
    Network {
        stage: Stage,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid endpoint catalog {}: {message}", .path.display())]
    Catalog { path: PathBuf, message: String },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ProbeError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ProbeError::ConfigNotFound { .. }
                | ProbeError::MissingSettings { .. }
                | ProbeError::InvalidSetting { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ProbeError::Io {
            path: path.into(),
            source,
        }
    }
}
