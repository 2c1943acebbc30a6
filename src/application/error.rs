use thiserror::Error;

use crate::{
    application::segments::FetchError, config::LoadError, domain::error::DomainError,
    infra::error::InfraError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Stable label for logs and exit reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Domain(_) => "domain",
            AppError::Infra(InfraError::Io(_)) => "io",
            AppError::Infra(InfraError::Telemetry(_)) => "telemetry",
            AppError::Infra(InfraError::Configuration { .. }) | AppError::Config(_) => {
                "configuration"
            }
            AppError::Fetch(_) => "fetch",
            AppError::Validation(_) => "validation",
            AppError::Unexpected(_) => "unexpected",
        }
    }
}
