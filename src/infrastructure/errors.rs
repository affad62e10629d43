use crate::domain::errors::DomainError;
use thiserror::Error;

/// Errores de infraestructura.
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Failed to start capture process: {0}")]
    CaptureSpawn(String),

    #[error("A capture process is already running (pid {0:?})")]
    CaptureAlreadyActive(Option<u32>),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
