//! Error types for Pylon.
//!
//! [`HttpError`] is the single error vocabulary of the request pipeline.
//! Every stage — validator, auth gate, shared middleware, header hook,
//! handler, dispatcher — short-circuits by returning it, and the error
//! boundary turns it into exactly one JSON envelope response.
//!
//! Two variants have fixed semantics mandated by the pipeline contract:
//!
//! - [`HttpError::Validation`] is always status 400 and always carries the
//!   complete, ordered list of field errors, so clients get full validation
//!   feedback in one round trip.
//! - [`HttpError::Transport`] marks failures after the response head was
//!   committed (mid-file, mid-stream). By policy it is logged, never
//!   rendered into a second response.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`HttpError`].
pub type HttpResult<T> = Result<T, HttpError>;

/// A single validation failure tied to one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// The offending field, e.g. `"name"` or `"items[2].price"`.
    pub field: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Standard error type for the Pylon pipeline.
///
/// # Example
///
/// ```
/// use pylon_core::{FieldError, HttpError};
///
/// fn check_name(name: &str) -> Result<(), HttpError> {
///     if name.is_empty() {
///         return Err(HttpError::validation(vec![FieldError::new(
///             "name",
///             "must not be empty",
///         )]));
///     }
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum HttpError {
    /// Request validation failed. Always status 400; carries every field
    /// error the validator reported, in order.
    #[error("validation failed for {} field(s)", .errors.len())]
    Validation {
        /// The complete, ordered list of field errors.
        errors: Vec<FieldError>,
    },

    /// Authentication failed (401).
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message.
        message: String,
    },

    /// Authorization denied (403).
    #[error("forbidden: {message}")]
    Forbidden {
        /// Human-readable error message.
        message: String,
    },

    /// Resource not found (404).
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// A failure with an explicit status code and optional structured
    /// detail, for endpoints that raise domain-specific HTTP errors.
    #[error("{message}")]
    Status {
        /// The HTTP status to respond with.
        status: StatusCode,
        /// Human-readable error message.
        message: String,
        /// Optional structured detail exposed in the envelope.
        info: Option<serde_json::Value>,
    },

    /// Endpoint authoring mistake: payload/kind mismatch, missing auth gate
    /// under a deny policy, and similar. A server fault (500), not client
    /// input.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// Failure while sending a file or relaying a stream after the response
    /// head was committed. Logged by the streaming stages; never rendered.
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable error message.
        message: String,
    },

    /// Any other failure bubbling out of auth, middleware, or a handler.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying cause (never exposed to clients).
        source: Option<anyhow::Error>,
    },
}

impl HttpError {
    /// Creates a validation error carrying the full ordered error list.
    #[must_use]
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation { errors }
    }

    /// Creates an authentication error (401).
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates an authorization error (403).
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a not-found error (404).
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates an error with an explicit status code.
    #[must_use]
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
            info: None,
        }
    }

    /// Creates an error with an explicit status code and structured detail.
    #[must_use]
    pub fn status_with_info(
        status: StatusCode,
        message: impl Into<String>,
        info: serde_json::Value,
    ) -> Self {
        Self::Status {
            status,
            message: message.into(),
            info: Some(info),
        }
    }

    /// Creates a configuration error (500).
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a transport error for a committed-response failure.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an internal error (500).
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with the underlying cause attached.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Status { status, .. } => *status,
            Self::Configuration { .. } | Self::Transport { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns a machine-readable error code for the envelope.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Status { .. } => "HTTP_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Converts this error to a serializable envelope.
    ///
    /// The internal variant's source chain is deliberately absent from the
    /// envelope; it belongs in logs only.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: self.error_details(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }

    /// Structured detail for the envelope, where a variant carries any.
    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation { errors } => serde_json::to_value(errors).ok(),
            Self::Status { info, .. } => info.clone(),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for HttpError {
    fn from(source: anyhow::Error) -> Self {
        Self::Internal {
            message: source.to_string(),
            source: Some(source),
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional structured detail (for validation errors, the ordered
    /// `[{field, message}]` list).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
