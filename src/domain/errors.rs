use thiserror::Error;

/// Errores del dominio.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid channel name: {0}")]
    InvalidChannelName(String),

    #[error("Invalid quality preference: {0}")]
    InvalidQuality(String),
}
