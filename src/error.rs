//! Error types for the import system.
//!
//! This module provides the error hierarchy for every stage of an import:
//! loading and validating the API definition, talking to the 3scale
//! Account Management API, and running the synchronization pipeline.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the import system.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Configuration and spec loading errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote API errors.
    #[error("3scale API error: {0}")]
    Remote(#[from] RemoteError),

    /// Pipeline errors.
    #[error("Import aborted: {0}")]
    Pipeline(#[from] PipelineError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration and API definition errors, raised before the pipeline starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The definition file was not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The definition could not be read or parsed.
    #[error("JSON/YAML validation failed: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// The loaded document is neither a JSON nor a YAML mapping.
    #[error("only JSON/YAML format is supported")]
    UnsupportedFormat,

    /// OpenAPI schema validation failed.
    #[error("OpenAPI schema validation failed: {message}")]
    SchemaValidation {
        /// Description of the first violation.
        message: String,
        /// Document path that failed validation.
        field: Option<String>,
    },

    /// A required option is missing.
    #[error("Missing required option: {name}")]
    MissingOption {
        /// Name of the missing option.
        name: String,
    },

    /// An option carries an invalid value.
    #[error("Invalid value for {name}: {message}")]
    InvalidOption {
        /// Name of the option.
        name: String,
        /// Why the value was rejected.
        message: String,
    },
}

/// Classification of a structured error list returned by the remote API.
///
/// Internal logic only ever switches on this enumeration, never on payload text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// An entity with the same system name already exists in the parent scope.
    SystemNameTaken,
    /// Any other validation error.
    Validation,
}

/// Errors talking to the remote API.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// A lookup expecting a concrete id received zero or an empty reference.
    #[error("Invalid {entity} id: '{reference}'")]
    InvalidId {
        /// Entity kind.
        entity: &'static str,
        /// The reference that was supplied.
        reference: String,
    },

    /// Lookup by id and by system name both failed.
    #[error("{entity} not found: {reference}")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// The id or system name that was looked up.
        reference: String,
    },

    /// The remote returned a structured error list.
    #[error("{message}: {errors}")]
    Api {
        /// What the caller was trying to do.
        message: String,
        /// Classification of the error list.
        kind: ApiErrorKind,
        /// The structured error list, as returned.
        errors: serde_json::Value,
    },

    /// Authentication failed.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// Request failed with an unexpected HTTP status.
    #[error("Request failed: {status} - {message}")]
    ApiRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("Network error: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from API.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A step failed; the remaining steps were not run.
    #[error("step '{step}' failed: {source}")]
    StepFailed {
        /// Name of the failing step.
        step: &'static str,
        /// Underlying error.
        source: Box<ImportError>,
    },

    /// A step read a context slot that no earlier step populated.
    #[error("context slot '{slot}' read before it was populated")]
    MissingContext {
        /// Name of the slot.
        slot: &'static str,
    },
}

/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;

impl ImportError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Remote(RemoteError::RateLimited { .. } | RemoteError::NetworkError { .. })
        )
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::Remote(RemoteError::RateLimited { retry_after_secs }) => Some(*retry_after_secs),
            Self::Remote(RemoteError::NetworkError { .. }) => Some(1),
            _ => None,
        }
    }

    /// Returns true if this is a conflict-already-exists api error.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(
            self,
            Self::Remote(RemoteError::Api {
                kind: ApiErrorKind::SystemNameTaken,
                ..
            })
        )
    }
}

impl ConfigError {
    /// Creates a schema validation error for a specific document path.
    #[must_use]
    pub fn schema(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::SchemaValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a parse error without a location.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location: None,
        }
    }
}

impl ApiErrorKind {
    /// Classifies a structured error payload.
    ///
    /// The API reports uniqueness violations as
    /// `{"system_name": ["has already been taken"]}`.
    #[must_use]
    pub fn classify(errors: &serde_json::Value) -> Self {
        let taken = errors
            .get("system_name")
            .map(|messages| match messages {
                serde_json::Value::Array(list) => list
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .any(is_taken_message),
                serde_json::Value::String(message) => is_taken_message(message),
                _ => false,
            })
            .unwrap_or(false);

        if taken {
            Self::SystemNameTaken
        } else {
            Self::Validation
        }
    }
}

fn is_taken_message(message: &str) -> bool {
    message.contains("has already been taken")
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SystemNameTaken => "system name already taken",
            Self::Validation => "validation",
        };
        write!(f, "{s}")
    }
}

impl RemoteError {
    /// Creates an api error from a structured error list, classifying it.
    #[must_use]
    pub fn api(message: impl Into<String>, errors: serde_json::Value) -> Self {
        Self::Api {
            message: message.into(),
            kind: ApiErrorKind::classify(&errors),
            errors,
        }
    }

    /// Creates an API request error.
    #[must_use]
    pub fn request_failed(status: u16, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, reference: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            reference: reference.into(),
        }
    }
}
