//! Error types for duolink.

use thiserror::Error;

/// Crate-level error for configuration and command surfaces.
///
/// Protocol and storage failures inside the login engine use
/// [`crate::auth::AuthError`] and convert into this type at the edge.
#[derive(Error, Debug)]
pub enum DuolinkError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Login not completed: {0}")]
    LoginNotCompleted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for DuolinkError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DuolinkError>;
