//! Error types for the file-sharing client
//!
//! This module defines the error taxonomy shared by the cipher codec,
//! the catalog protocol, and the transfer client.

use std::fmt;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, ShareError>;

/// Coarse classification used to decide how an error is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Protocol,
    Decrypt,
    Validation,
    Storage,
    Config,
}

/// Error type for file-sharing operations
#[derive(Debug, Clone)]
pub enum ShareError {
    /// Request failed or the server answered with a non-2xx status
    NetworkError {
        message: String,
        address: Option<String>,
        source: Option<String>,
    },

    /// Malformed or unexpected payload from the server
    ProtocolError {
        message: String,
        source: Option<String>,
    },

    /// Bad padding, truncated blob or wrong key
    DecryptError {
        message: String,
        source: Option<String>,
    },

    /// Input rejected before any network call
    ValidationError {
        message: String,
        field: Option<String>,
    },

    /// Local file I/O errors
    StorageError {
        message: String,
        path: Option<String>,
        source: Option<String>,
    },

    /// Configuration errors
    ConfigError {
        message: String,
        field: Option<String>,
    },
}

impl ShareError {
    /// Create a new NetworkError
    pub fn network_error(message: impl Into<String>) -> Self {
        ShareError::NetworkError {
            message: message.into(),
            address: None,
            source: None,
        }
    }

    /// Create a new NetworkError with address
    pub fn network_error_with_address(message: impl Into<String>, address: impl Into<String>) -> Self {
        ShareError::NetworkError {
            message: message.into(),
            address: Some(address.into()),
            source: None,
        }
    }

    /// Create a new NetworkError with address and source
    pub fn network_error_full(message: impl Into<String>, address: impl Into<String>, source: impl Into<String>) -> Self {
        ShareError::NetworkError {
            message: message.into(),
            address: Some(address.into()),
            source: Some(source.into()),
        }
    }

    /// Create a new ProtocolError
    pub fn protocol_error(message: impl Into<String>) -> Self {
        ShareError::ProtocolError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new ProtocolError with source
    pub fn protocol_error_with_source(message: impl Into<String>, source: impl Into<String>) -> Self {
        ShareError::ProtocolError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new DecryptError
    pub fn decrypt_error(message: impl Into<String>) -> Self {
        ShareError::DecryptError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new DecryptError with source
    pub fn decrypt_error_with_source(message: impl Into<String>, source: impl Into<String>) -> Self {
        ShareError::DecryptError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new ValidationError
    pub fn validation_error(message: impl Into<String>) -> Self {
        ShareError::ValidationError {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new ValidationError with field
    pub fn validation_error_with_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        ShareError::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new StorageError with path and source
    pub fn storage_error_full(message: impl Into<String>, path: impl Into<String>, source: impl Into<String>) -> Self {
        ShareError::StorageError {
            message: message.into(),
            path: Some(path.into()),
            source: Some(source.into()),
        }
    }

    /// Create a new ConfigError with field
    pub fn config_error_with_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        ShareError::ConfigError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShareError::NetworkError { .. } => ErrorKind::Network,
            ShareError::ProtocolError { .. } => ErrorKind::Protocol,
            ShareError::DecryptError { .. } => ErrorKind::Decrypt,
            ShareError::ValidationError { .. } => ErrorKind::Validation,
            ShareError::StorageError { .. } => ErrorKind::Storage,
            ShareError::ConfigError { .. } => ErrorKind::Config,
        }
    }

    /// The bare message, without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            ShareError::NetworkError { message, .. }
            | ShareError::ProtocolError { message, .. }
            | ShareError::DecryptError { message, .. }
            | ShareError::ValidationError { message, .. }
            | ShareError::StorageError { message, .. }
            | ShareError::ConfigError { message, .. } => message,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let ctx = context.into();
        match &mut self {
            ShareError::NetworkError { source, .. }
            | ShareError::ProtocolError { source, .. }
            | ShareError::DecryptError { source, .. }
            | ShareError::StorageError { source, .. } => {
                *source = Some(source.as_ref().map_or_else(|| ctx.clone(), |s| format!("{}: {}", s, ctx)));
            }
            _ => {}
        }
        self
    }
}

impl fmt::Display for ShareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareError::NetworkError { message, address, source } => {
                match (address, source) {
                    (Some(a), Some(s)) => write!(f, "Network error: {} (address: {}, source: {})", message, a, s),
                    (Some(a), None) => write!(f, "Network error: {} (address: {})", message, a),
                    (None, Some(s)) => write!(f, "Network error: {} (source: {})", message, s),
                    (None, None) => write!(f, "Network error: {}", message),
                }
            }
            ShareError::ProtocolError { message, source } => {
                if let Some(src) = source {
                    write!(f, "Protocol error: {} (source: {})", message, src)
                } else {
                    write!(f, "Protocol error: {}", message)
                }
            }
            ShareError::DecryptError { message, source } => {
                if let Some(src) = source {
                    write!(f, "Decrypt error: {} (source: {})", message, src)
                } else {
                    write!(f, "Decrypt error: {}", message)
                }
            }
            ShareError::ValidationError { message, field } => {
                if let Some(field_val) = field {
                    write!(f, "Validation error: {} (field: {})", message, field_val)
                } else {
                    write!(f, "Validation error: {}", message)
                }
            }
            ShareError::StorageError { message, path, source } => {
                match (path, source) {
                    (Some(p), Some(s)) => write!(f, "Storage error: {} (path: {}, source: {})", message, p, s),
                    (Some(p), None) => write!(f, "Storage error: {} (path: {})", message, p),
                    (None, Some(s)) => write!(f, "Storage error: {} (source: {})", message, s),
                    (None, None) => write!(f, "Storage error: {}", message),
                }
            }
            ShareError::ConfigError { message, field } => {
                if let Some(field_val) = field {
                    write!(f, "Config error: {} (field: {})", message, field_val)
                } else {
                    write!(f, "Config error: {}", message)
                }
            }
        }
    }
}

impl std::error::Error for ShareError {}

impl From<std::io::Error> for ShareError {
    fn from(err: std::io::Error) -> Self {
        ShareError::storage_error_full(err.to_string(), "unknown".to_string(), err.kind().to_string())
    }
}

impl From<serde_json::Error> for ShareError {
    fn from(err: serde_json::Error) -> Self {
        ShareError::protocol_error_with_source("Failed to parse JSON data", err.to_string())
    }
}

impl From<url::ParseError> for ShareError {
    fn from(err: url::ParseError) -> Self {
        ShareError::ConfigError {
            message: format!("Invalid URL: {}", err),
            field: Some("server".to_string()),
        }
    }
}

impl From<hex::FromHexError> for ShareError {
    fn from(err: hex::FromHexError) -> Self {
        ShareError::ConfigError {
            message: format!("Invalid hex key: {}", err),
            field: Some("key".to_string()),
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ShareError {
    fn from(err: reqwest::Error) -> Self {
        let address = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        if err.is_decode() {
            ShareError::protocol_error_with_source("Unexpected response body", err.to_string())
        } else {
            ShareError::network_error_full("Request failed", address, err.to_string())
        }
    }
}
