use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Upstream request failed: {0}")]
    UpstreamError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Token error: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Token verification failed: {message}")]
    VerificationError { message: String },

    #[error("Signing key not found: {kid}")]
    UnknownSigningKey { kid: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Invalid user config: {message}")]
    InvalidUserConfig { message: String },
}

/// Coarse grouping used as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Authentication,
    Storage,
    Data,
}

impl GatewayError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GatewayError::UpstreamError(_) => ErrorCategory::Network,
            GatewayError::ConfigError { .. }
            | GatewayError::MissingConfigError { .. }
            | GatewayError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            GatewayError::TokenError(_)
            | GatewayError::VerificationError { .. }
            | GatewayError::UnknownSigningKey { .. } => ErrorCategory::Authentication,
            GatewayError::IoError(_) | GatewayError::StorageError { .. } => ErrorCategory::Storage,
            GatewayError::SerializationError(_) | GatewayError::InvalidUserConfig { .. } => {
                ErrorCategory::Data
            }
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        GatewayError::ConfigError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
