//! Configuration types.
//!
//! ```toml
//! [api]
//! host = "https://api.example.com"
//! timeout_secs = 30
//!
//! [headers]
//! platform = "Web"
//! locale = "ru"
//!
//! [auth]
//! login_page = "/login"
//!
//! [auth.token]
//! sign_in_pointer = "/access_token"
//! max_age_secs = 1800
//!
//! [auth.refresh]
//! request_pointer = "/refresh_token"
//! response_pointer = ""
//! max_age_secs = 2505600
//!
//! [session]
//! refresh_interval_secs = 60
//! refresh_on_focus = true
//! refresh_timeout_secs = 10
//!
//! [cache]
//! ttl_secs = 0
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Environment variable holding the API base location.
pub const API_HOST_ENV: &str = "VITRINE_API_HOST";

// ─────────────────────────────────────────────────────────────────────────────
// Root
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitrineConfig {
    /// API base location and transport settings.
    pub api: ApiConfig,
    /// Standard headers attached to every request.
    pub headers: HeaderConfig,
    /// Identity-provider contract.
    pub auth: AuthConfig,
    /// Session lifecycle timers.
    pub session: SessionConfig,
    /// Request cache policy.
    pub cache: CacheConfig,
}

impl VitrineConfig {
    /// Create a config with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Convenience constructor pointing at an API host.
    pub fn with_api_host(mut self, host: impl Into<String>) -> Self {
        self.api.host = Some(host.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API
// ─────────────────────────────────────────────────────────────────────────────

/// API base location and per-request timeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the catalog API and identity provider.
    ///
    /// Optional at load time. Requests fail with [`ConfigError::MissingApiHost`]
    /// when it is absent.
    pub host: Option<String>,
    /// Timeout for ordinary API requests.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: None,
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Get the configured host, or a configuration error if it is missing or blank.
    pub fn require_host(&self) -> Result<&str> {
        match self.host.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => Ok(host),
            _ => Err(ConfigError::MissingApiHost {
                env_var: API_HOST_ENV.to_string(),
            }),
        }
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Headers
// ─────────────────────────────────────────────────────────────────────────────

/// Standard headers sent with every outbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Name of the client-platform header.
    pub platform_header: String,
    /// Client-platform identifier.
    pub platform: String,
    /// Name of the locale header.
    pub locale_header: String,
    /// Locale sent to the API.
    pub locale: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            platform_header: "X-AD-OS".to_string(),
            platform: "Web".to_string(),
            locale_header: "X-Ad-Locale".to_string(),
            locale: "ru".to_string(),
        }
    }
}

impl HeaderConfig {
    /// The standard header pairs, in insertion order.
    pub fn standard(&self) -> [(&str, &str); 2] {
        [
            (self.platform_header.as_str(), self.platform.as_str()),
            (self.locale_header.as_str(), self.locale.as_str()),
        ]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity provider
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP method used by an identity-provider endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl EndpointMethod {
    /// Uppercase method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointMethod::Get => "GET",
            EndpointMethod::Post => "POST",
            EndpointMethod::Put => "PUT",
            EndpointMethod::Patch => "PATCH",
            EndpointMethod::Delete => "DELETE",
        }
    }
}

/// A single identity-provider endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub path: String,
    pub method: EndpointMethod,
}

impl Endpoint {
    fn new(path: &str, method: EndpointMethod) -> Self {
        Self {
            path: path.to_string(),
            method,
        }
    }
}

/// Identity-provider endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub sign_in: Endpoint,
    pub sign_out: Endpoint,
    pub session: Endpoint,
    pub refresh: Endpoint,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            sign_in: Endpoint::new("/auth/login", EndpointMethod::Post),
            sign_out: Endpoint::new("/auth/logout", EndpointMethod::Post),
            session: Endpoint::new("/auth/users/me", EndpointMethod::Get),
            refresh: Endpoint::new("/auth/refresh", EndpointMethod::Post),
        }
    }
}

/// Access token extraction and lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// JSON pointer to the access token in the sign-in response.
    pub sign_in_pointer: String,
    /// Scheme prefixed to the token in the auth header.
    pub token_type: String,
    /// Header carrying the access token.
    pub header_name: String,
    /// Access token max age.
    pub max_age_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            sign_in_pointer: "/access_token".to_string(),
            token_type: "Bearer".to_string(),
            header_name: "Authorization".to_string(),
            max_age_secs: 1800,
        }
    }
}

/// Refresh token extraction, submission and lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// JSON pointer to the refresh token in the sign-in and refresh responses.
    pub sign_in_pointer: String,
    /// JSON pointer to the new access token in the refresh response (`""` is the root).
    pub response_pointer: String,
    /// JSON pointer where the refresh token is placed in the refresh request body.
    pub request_pointer: String,
    /// Refresh token max age.
    pub max_age_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            sign_in_pointer: "/refresh_token".to_string(),
            response_pointer: String::new(),
            request_pointer: "/refresh_token".to_string(),
            max_age_secs: 2_505_600,
        }
    }
}

/// The identity-provider contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub endpoints: EndpointsConfig,
    pub token: TokenConfig,
    pub refresh: RefreshConfig,
    /// Navigation target after sign-out.
    pub login_page: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            endpoints: EndpointsConfig::default(),
            token: TokenConfig::default(),
            refresh: RefreshConfig::default(),
            login_page: "/login".to_string(),
        }
    }
}

impl AuthConfig {
    /// Access token max age as a [`Duration`].
    pub fn access_max_age(&self) -> Duration {
        Duration::from_secs(self.token.max_age_secs)
    }

    /// Refresh token max age as a [`Duration`].
    pub fn refresh_max_age(&self) -> Duration {
        Duration::from_secs(self.refresh.max_age_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Session lifecycle timers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Periodic refresh interval while authenticated. `0` disables it.
    pub refresh_interval_secs: u64,
    /// Whether regaining focus triggers a refresh.
    pub refresh_on_focus: bool,
    /// Upper bound on a single refresh round trip.
    pub refresh_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 60,
            refresh_on_focus: true,
            refresh_timeout_secs: 10,
        }
    }
}

impl SessionConfig {
    /// Refresh timeout as a [`Duration`].
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }

    /// Periodic refresh interval, if enabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }

    /// Reject values that would hang waiting requests forever.
    pub fn validate(&self) -> Result<()> {
        if self.refresh_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.refresh_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache
// ─────────────────────────────────────────────────────────────────────────────

/// Request cache policy for GET requests that do not bypass the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a cached response stays fresh. `0` disables caching.
    pub ttl_secs: u64,
}

impl CacheConfig {
    /// TTL as a [`Duration`], if caching is enabled.
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_identity_provider_contract() {
        let config = VitrineConfig::new();
        assert_eq!(config.auth.endpoints.sign_in.path, "/auth/login");
        assert_eq!(config.auth.endpoints.sign_out.path, "/auth/logout");
        assert_eq!(config.auth.endpoints.session.method, EndpointMethod::Get);
        assert_eq!(config.auth.endpoints.refresh.path, "/auth/refresh");
        assert_eq!(config.auth.token.max_age_secs, 1800);
        assert_eq!(config.auth.refresh.max_age_secs, 2_505_600);
        assert_eq!(config.auth.refresh.response_pointer, "");
        assert_eq!(config.auth.login_page, "/login");
        assert_eq!(config.session.refresh_interval(), Some(Duration::from_secs(60)));
        assert!(config.cache.ttl().is_none());
    }

    #[test]
    fn test_require_host() {
        let mut api = ApiConfig::default();
        assert!(matches!(
            api.require_host(),
            Err(ConfigError::MissingApiHost { .. })
        ));

        api.host = Some("   ".to_string());
        assert!(api.require_host().is_err());

        api.host = Some("https://api.example.com".to_string());
        assert_eq!(api.require_host().unwrap(), "https://api.example.com");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = VitrineConfig::from_toml(
            r#"
[api]
host = "http://localhost:9000"

[headers]
locale = "en"

[auth.endpoints.refresh]
path = "/v2/refresh"
method = "put"
"#,
        )
        .unwrap();

        assert_eq!(config.api.host.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.headers.locale, "en");
        assert_eq!(config.headers.platform, "Web");
        assert_eq!(config.auth.endpoints.refresh.path, "/v2/refresh");
        assert_eq!(config.auth.endpoints.refresh.method, EndpointMethod::Put);
        assert_eq!(config.auth.endpoints.sign_in.path, "/auth/login");
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = VitrineConfig::new().with_api_host("http://localhost:1");
        let parsed = VitrineConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_zero_refresh_timeout_rejected() {
        let session = SessionConfig {
            refresh_timeout_secs: 0,
            ..Default::default()
        };
        assert!(session.validate().is_err());
        assert!(SessionConfig::default().validate().is_ok());
    }
}
