//! Client error types.

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The client is not configured well enough to issue requests.
    /// Raised before any network activity and never retried.
    #[error("Configuration error: {0}")]
    Config(#[from] vitrine_config::ConfigError),

    /// The request itself is unusable (e.g. an empty path).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server rejected the credential and the session could not be
    /// recovered.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Error message from server.
        message: String,
    },

    /// Server returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error code from server.
        code: String,
        /// Error message from server.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// HTTP status of an error response, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unauthorized { .. } => Some(401),
            Error::NotFound(_) => Some(404),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        self.status() == Some(401)
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|status| status >= 500)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error body returned by the catalog API. Both fields are optional on the
/// wire.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, alias = "detail")]
    pub message: Option<String>,
}

impl Error {
    /// Build the error for a non-success response body.
    pub(crate) fn from_response(status: u16, body: &[u8]) -> Self {
        let parsed: ErrorResponse = serde_json::from_slice(body).unwrap_or_default();
        let message = parsed
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status));

        match status {
            401 => Error::Unauthorized { message },
            404 => Error::NotFound(message),
            _ => Error::Api {
                status,
                code: parsed.code.unwrap_or_else(|| "unknown".to_string()),
                message,
            },
        }
    }
}
