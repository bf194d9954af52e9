use thiserror::Error;

use crate::error::DuolinkError;

/// Failures talking to the authorization server or persisting credentials.
///
/// Every variant except [`AuthError::Io`] belongs to the transport class: a
/// device-flow session that sees one ends immediately.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Whether this error came from the wire rather than local state.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return Self::InvalidResponse(error.to_string());
        }
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<AuthError> for DuolinkError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Io(message) => DuolinkError::Io(std::io::Error::other(message)),
            other => DuolinkError::Authentication(other.to_string()),
        }
    }
}
