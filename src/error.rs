//! Error types for the BigQuery MCP Server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Every variant maps to a short `error_type` label that is reported back to the
//! calling agent inside the failure envelope.

use gcp_bigquery_client::error::BQError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BqError {
    #[error("{message}")]
    Configuration { message: String },

    #[error("{message}")]
    Engine {
        message: String,
        /// Engine classification, e.g. "invalidQuery", "notFound", "accessDenied"
        reason: String,
        /// HTTP status of the failed call. None for job-level failures.
        status: Option<u16>,
    },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Request failed: {message}")]
    Transport { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BqError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an engine error carrying the engine's own classification.
    pub fn engine(message: impl Into<String>, reason: impl Into<String>, status: Option<u16>) -> Self {
        Self::Engine {
            message: message.into(),
            reason: reason.into(),
            status,
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a timeout error for an operation that ran past its limit.
    pub fn timeout(operation: impl Into<String>, limit_secs: u64) -> Self {
        Self::Timeout {
            message: format!("{} exceeded {}s", operation.into(), limit_secs),
        }
    }

    /// Create a timeout error for an HTTP request whose limit is not known here.
    pub fn request_timed_out(detail: impl Into<String>) -> Self {
        Self::Timeout {
            message: format!("BigQuery request timed out ({})", detail.into()),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Category label reported as `error_type` in failure envelopes.
    ///
    /// Engine errors pass the engine's reason through unchanged.
    pub fn error_type(&self) -> &str {
        match self {
            Self::Configuration { .. } => "ConfigurationError",
            Self::Engine { reason, .. } => reason.as_str(),
            Self::Authentication { .. } => "AuthenticationError",
            Self::Transport { .. } => "TransportError",
            Self::Timeout { .. } => "Timeout",
            Self::InvalidInput { .. } => "InvalidInput",
            Self::Internal { .. } => "InternalError",
        }
    }

    /// Check if this error is transient. Informational only; nothing here retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Engine { status, reason, .. } => {
                matches!(status, Some(429 | 500 | 502 | 503 | 504))
                    || matches!(reason.as_str(), "backendError" | "rateLimitExceeded")
            }
            _ => false,
        }
    }
}

/// Fallback label for an HTTP status when the engine body carries no reason.
pub fn status_label(status: u16) -> &'static str {
    match status {
        400 => "BadRequest",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "NotFound",
        409 => "Conflict",
        412 => "PreconditionFailed",
        429 => "TooManyRequests",
        500 => "InternalServerError",
        501 => "MethodNotImplemented",
        502 => "BadGateway",
        503 => "ServiceUnavailable",
        504 => "GatewayTimeout",
        400..=499 => "ClientError",
        _ => "ServerError",
    }
}

/// Build an engine error from the parts of a BigQuery error response.
///
/// The reason is taken from the first detailed error, then the RPC status,
/// then the HTTP status class.
pub fn engine_error(
    status: Option<u16>,
    message: String,
    reason: Option<String>,
    rpc_status: Option<String>,
) -> BqError {
    let reason = reason
        .filter(|r| !r.is_empty())
        .or(rpc_status.filter(|s| !s.is_empty()))
        .unwrap_or_else(|| status.map_or("ServerError", status_label).to_string());

    let message = if message.trim().is_empty() {
        match status {
            Some(code) => format!("BigQuery returned HTTP {}", code),
            None => "BigQuery request failed".to_string(),
        }
    } else {
        message
    };

    BqError::engine(message, reason, status)
}

fn request_failure(timed_out: bool, detail: String) -> BqError {
    if timed_out {
        BqError::request_timed_out(detail)
    } else {
        BqError::transport(detail)
    }
}

impl From<BQError> for BqError {
    fn from(err: BQError) -> Self {
        match err {
            BQError::ResponseError { error } => {
                let body = error.error;
                engine_error(
                    u16::try_from(body.code).ok(),
                    body.message.to_string(),
                    body.errors
                        .iter()
                        .find_map(|detail| detail.get("reason"))
                        .map(ToString::to_string),
                    Some(body.status.to_string()),
                )
            }
            BQError::RequestError(e) => request_failure(e.is_timeout(), e.to_string()),
            BQError::InvalidServiceAccountKey(_)
            | BQError::InvalidServiceAccountAuthenticator(_)
            | BQError::InvalidInstalledFlowAuthenticator(_)
            | BQError::InvalidApplicationDefaultCredentialsAuthenticator(_)
            | BQError::InvalidAuthorizedUserAuthenticator(_)
            | BQError::AuthError(_)
            | BQError::YupAuthError(_)
            | BQError::NoToken => BqError::authentication(err.to_string()),
            BQError::SerializationError(_) => {
                BqError::internal(format!("Malformed BigQuery response: {}", err))
            }
            other => BqError::internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for BqError {
    fn from(err: serde_json::Error) -> Self {
        BqError::internal(format!("Malformed BigQuery response: {}", err))
    }
}

/// Result type alias for BigQuery operations.
pub type BqResult<T> = Result<T, BqError>;
