use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

use crate::application::service::ServiceError;
use crate::config::LoadError;
use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

/// An error flattened into its source chain for logging.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    /// The chain joined outermost first.
    pub fn chain(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("failed to read `{}`", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("`{}` is not valid JSON", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} not found")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::schedule::LookupError;

    #[test]
    fn report_walks_the_source_chain() {
        let path = PathBuf::from("missing.json");
        let err = AppError::Input {
            path,
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let report = err.report();
        assert_eq!(
            report.messages,
            vec!["failed to read `missing.json`", "no such file"]
        );
        assert_eq!(report.chain(), "failed to read `missing.json`: no such file");
    }

    #[test]
    fn transparent_layers_do_not_repeat_messages() {
        let err = AppError::from(ServiceError::from(LookupError::MissingKey { position: 2 }));
        assert_eq!(
            err.report().messages,
            vec!["schedule entry at position 2 has no stable key"]
        );
    }
}
