//! Error types for the session layer.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while talking to the identity provider or
/// maintaining the session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Configuration error (e.g. the API host is not set).
    #[error("Config error: {0}")]
    Config(#[from] vitrine_config::ConfigError),

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// The identity provider returned a non-success status.
    #[error("Identity provider returned HTTP {status}{}", server_suffix(.message))]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Structured `message` field from the response body, if any.
        message: Option<String>,
    },

    /// The response body did not carry the expected token or identity.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No refresh token is available to exchange.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// A refresh round trip failed.
    #[error(transparent)]
    Refresh(#[from] crate::refresh::RefreshFailure),

    /// The session was signed out while the operation was in flight.
    #[error("Session was signed out")]
    SignedOut,

    /// Sign-in failed; carries a single human-readable message.
    #[error("{0}")]
    Login(String),

    /// Token persistence failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn server_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl From<reqwest::Error> for SessionError {
    fn from(e: reqwest::Error) -> Self {
        SessionError::Network(e.to_string())
    }
}

impl From<url::ParseError> for SessionError {
    fn from(e: url::ParseError) -> Self {
        SessionError::Config(vitrine_config::ConfigError::InvalidValue {
            field: "api.host".to_string(),
            reason: e.to_string(),
        })
    }
}

impl SessionError {
    /// HTTP status when the identity provider answered with an error.
    pub fn status(&self) -> Option<u16> {
        match self {
            SessionError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the identity provider rejected the credential (401).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
