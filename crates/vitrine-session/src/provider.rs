//! HTTP client for the identity provider.
//!
//! Talks to the four identity endpoints (sign-in, sign-out, current session,
//! refresh), persists token material through a [`TokenStore`], and broadcasts
//! every state change on a [`watch`] channel. It performs single network round
//! trips only; coalescing concurrent refreshes is the job of
//! [`RefreshCoordinator`](crate::refresh::RefreshCoordinator).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;
use vitrine_config::{AuthConfig, Endpoint, EndpointMethod, HeaderConfig, VitrineConfig};

use crate::error::{Result, SessionError};
use crate::pointer::{body_with_token, read_token};
use crate::state::{AccessToken, AuthState, SessionStatus, User};
use crate::tokens::{SharedTokenStore, StoredTokens};

/// Sign-in credentials.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What [`IdentityProvider::restore`] found in persisted storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restored {
    /// A persisted access token was accepted by the session endpoint.
    Authenticated,
    /// Only a usable refresh token remains; a refresh is required.
    NeedsRefresh,
    /// Nothing usable was persisted.
    Empty,
}

/// Identity-provider client.
#[derive(Debug)]
pub struct IdentityProvider {
    http: Client,
    host: Option<String>,
    headers: HeaderConfig,
    auth: AuthConfig,
    timeout: Duration,
    tokens: SharedTokenStore,
    state: watch::Sender<AuthState>,
    generation: AtomicU64,
    /// Bumped by every sign-out; a refresh started under an older value
    /// must not reinstate the session.
    sign_outs: AtomicU64,
}

impl IdentityProvider {
    /// Create a provider from config, persisting tokens in `tokens`.
    pub fn new(config: &VitrineConfig, tokens: SharedTokenStore) -> Result<Self> {
        let http = Client::builder()
            .user_agent(format!("vitrine/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http(http, config, tokens))
    }

    /// Create a provider sharing an existing HTTP client.
    pub fn with_http(http: Client, config: &VitrineConfig, tokens: SharedTokenStore) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            http,
            host: config.api.host.clone(),
            headers: config.headers.clone(),
            auth: config.auth.clone(),
            timeout: config.api.timeout(),
            tokens,
            state,
            generation: AtomicU64::new(0),
            sign_outs: AtomicU64::new(0),
        }
    }

    /// The identity-provider contract in use.
    pub fn auth_config(&self) -> &AuthConfig {
        &self.auth
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// The in-memory access token, if any.
    pub fn access_token(&self) -> Option<AccessToken> {
        self.state.borrow().access_token.clone()
    }

    /// Name of the header carrying the access token.
    pub fn auth_header_name(&self) -> &str {
        &self.auth.token.header_name
    }

    /// Header value for a token, e.g. `Bearer abc`.
    pub fn auth_header_value(&self, token: &AccessToken) -> String {
        if self.auth.token.token_type.is_empty() {
            token.value.clone()
        } else {
            format!("{} {}", self.auth.token.token_type, token.value)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Endpoints
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign in and load the current user.
    ///
    /// Status is `loading` while the round trips are pending. On failure the
    /// previous state is restored.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<AccessToken> {
        let previous = self.state.send_replace(AuthState {
            status: SessionStatus::Loading,
            ..self.state()
        });

        match self.sign_in_inner(credentials).await {
            Ok(token) => {
                info!(login = %credentials.login, "Signed in");
                Ok(token)
            }
            Err(e) => {
                self.state.send_replace(previous);
                Err(e)
            }
        }
    }

    async fn sign_in_inner(&self, credentials: &Credentials) -> Result<AccessToken> {
        let endpoint = &self.auth.endpoints.sign_in;
        let doc = self
            .send(self.request(endpoint)?.json(credentials))
            .await?;

        let access = read_token(&doc, &self.auth.token.sign_in_pointer).ok_or_else(|| {
            SessionError::MalformedResponse(format!(
                "sign-in response has no token at '{}'",
                self.auth.token.sign_in_pointer
            ))
        })?;
        let refresh = read_token(&doc, &self.auth.refresh.sign_in_pointer);

        let stored = StoredTokens::issued(
            &access,
            self.auth.access_max_age(),
            refresh.as_deref(),
            self.auth.refresh_max_age(),
        );
        self.tokens.save(&stored).await?;

        let token = self.install(access, stored.access_expires_at, None);
        if let Err(e) = self.fetch_session().await {
            self.tokens.clear().await?;
            return Err(e);
        }
        Ok(token)
    }

    /// Fetch the current user with the in-memory access token.
    pub async fn fetch_session(&self) -> Result<User> {
        let token = self.access_token().ok_or_else(|| SessionError::Backend {
            status: 401,
            message: Some("no access token".to_string()),
        })?;

        let endpoint = &self.auth.endpoints.session;
        let request = self
            .request(endpoint)?
            .header(self.auth_header_name(), self.auth_header_value(&token));
        let doc = self.send(request).await?;

        let user_doc = match doc.get("user") {
            Some(user @ Value::Object(_)) => user.clone(),
            _ => doc,
        };
        let user: User = serde_json::from_value(user_doc)
            .map_err(|e| SessionError::MalformedResponse(format!("invalid identity: {}", e)))?;

        self.state.send_if_modified(|state| {
            // Only attach the user to the token it was fetched with.
            let same_token = state
                .access_token
                .as_ref()
                .is_some_and(|t| t.generation == token.generation);
            if same_token {
                state.user = Some(user.clone());
            }
            same_token
        });

        Ok(user)
    }

    /// Exchange the persisted refresh token for a new access token.
    ///
    /// One round trip, no retries.
    pub async fn refresh(&self) -> Result<AccessToken> {
        let epoch = self.sign_outs.load(Ordering::SeqCst);
        let stored = self.tokens.load().await?.unwrap_or_default();
        let refresh_token = stored
            .refresh_token
            .clone()
            .ok_or(SessionError::NoRefreshToken)?;

        let endpoint = &self.auth.endpoints.refresh;
        let body = body_with_token(&self.auth.refresh.request_pointer, &refresh_token);
        debug!(path = %endpoint.path, "Refreshing access token");
        let doc = self.send(self.request(endpoint)?.json(&body)).await?;

        let access = self.refreshed_access_token(&doc)?;
        let rotated = read_token(&doc, &self.auth.refresh.sign_in_pointer);

        let mut updated = StoredTokens::issued(
            &access,
            self.auth.access_max_age(),
            rotated.as_deref(),
            self.auth.refresh_max_age(),
        );
        if rotated.is_none() {
            updated.refresh_token = stored.refresh_token;
            updated.refresh_expires_at = stored.refresh_expires_at;
        }

        if self.sign_outs.load(Ordering::SeqCst) != epoch {
            debug!("Signed out during refresh; discarding new tokens");
            return Err(SessionError::SignedOut);
        }
        self.tokens.save(&updated).await?;

        let user = self.state.borrow().user.clone();
        match self.install_unless_signed_out(access, updated.access_expires_at, user, epoch) {
            Some(token) => Ok(token),
            None => {
                // The sign-out may have cleared storage before the save above.
                debug!("Signed out during refresh; discarding new tokens");
                self.tokens.clear().await?;
                Err(SessionError::SignedOut)
            }
        }
    }

    /// Whether a usable refresh token is persisted.
    pub async fn has_refresh_token(&self) -> bool {
        match self.tokens.load().await {
            Ok(stored) => stored.is_some_and(|t| t.refresh_token.is_some()),
            Err(e) => {
                warn!(error = %e, "Could not read persisted tokens");
                false
            }
        }
    }

    /// The root pointer may address either a bare token string or an object
    /// that carries the token at the sign-in pointer.
    fn refreshed_access_token(&self, doc: &Value) -> Result<String> {
        let pointer = &self.auth.refresh.response_pointer;
        read_token(doc, pointer)
            .or_else(|| {
                pointer
                    .is_empty()
                    .then(|| read_token(doc, &self.auth.token.sign_in_pointer))
                    .flatten()
            })
            .ok_or_else(|| {
                SessionError::MalformedResponse(format!(
                    "refresh response has no token at '{}'",
                    pointer
                ))
            })
    }

    /// Clear local state and persisted tokens, then notify the sign-out
    /// endpoint if a session existed.
    ///
    /// Returns whether a session was cleared. Network failures are logged and
    /// do not keep the session alive.
    pub async fn sign_out(&self) -> Result<bool> {
        let mut previous = AuthState::default();
        self.state.send_modify(|state| {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            previous = std::mem::take(state);
        });
        self.tokens.clear().await?;

        let Some(token) = previous.access_token else {
            return Ok(previous.status == SessionStatus::Authenticated);
        };

        let endpoint = &self.auth.endpoints.sign_out;
        let request = self
            .request(endpoint)?
            .header(self.auth_header_name(), self.auth_header_value(&token));
        if let Err(e) = self.send(request).await {
            warn!(error = %e, "Sign-out request failed; local session cleared anyway");
        }
        info!("Signed out");
        Ok(true)
    }

    /// Load persisted tokens into memory and validate them.
    pub async fn restore(&self) -> Result<Restored> {
        let Some(stored) = self.tokens.load().await? else {
            return Ok(Restored::Empty);
        };

        if let Some(access) = stored.access_token.clone() {
            self.install(access, stored.access_expires_at, None);
            match self.fetch_session().await {
                Ok(user) => {
                    info!(user = %user.display_name(), "Session restored");
                    return Ok(Restored::Authenticated);
                }
                Err(e) if e.is_unauthorized() => {
                    debug!("Persisted access token rejected");
                    self.state.send_replace(AuthState::default());
                }
                Err(e) => {
                    self.state.send_replace(AuthState::default());
                    return Err(e);
                }
            }
        }

        Ok(if stored.refresh_token.is_some() {
            Restored::NeedsRefresh
        } else {
            Restored::Empty
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────────

    fn install(
        &self,
        value: String,
        expires_at: Option<chrono::DateTime<chrono::Utc>>,
        user: Option<User>,
    ) -> AccessToken {
        let token = AccessToken {
            value,
            expires_at,
            generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.state
            .send_replace(AuthState::authenticated(token.clone(), user));
        token
    }

    /// Install a token unless a sign-out happened after `epoch`.
    ///
    /// The check and the install happen under the state channel's write lock,
    /// the same lock `sign_out` bumps the counter under.
    fn install_unless_signed_out(
        &self,
        value: String,
        expires_at: Option<chrono::DateTime<chrono::Utc>>,
        user: Option<User>,
        epoch: u64,
    ) -> Option<AccessToken> {
        let mut installed = None;
        self.state.send_if_modified(|state| {
            if self.sign_outs.load(Ordering::SeqCst) != epoch {
                return false;
            }
            let token = AccessToken {
                value: value.clone(),
                expires_at,
                generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
            };
            *state = AuthState::authenticated(token.clone(), user.clone());
            installed = Some(token);
            true
        });
        installed
    }

    fn url(&self, path: &str) -> Result<Url> {
        let host = self
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| vitrine_config::ConfigError::MissingApiHost {
                env_var: vitrine_config::API_HOST_ENV.to_string(),
            })?;
        let mut base = Url::parse(host)?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, endpoint: &Endpoint) -> Result<RequestBuilder> {
        let url = self.url(&endpoint.path)?;
        let mut builder = self
            .http
            .request(method(endpoint.method), url)
            .timeout(self.timeout);
        for (name, value) in self.headers.standard() {
            builder = builder.header(name, value);
        }
        Ok(builder)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned));
            return Err(SessionError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| SessionError::MalformedResponse(format!("invalid JSON: {}", e)))
    }
}

fn method(method: EndpointMethod) -> Method {
    match method {
        EndpointMethod::Get => Method::GET,
        EndpointMethod::Post => Method::POST,
        EndpointMethod::Put => Method::PUT,
        EndpointMethod::Patch => Method::PATCH,
        EndpointMethod::Delete => Method::DELETE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{InMemoryTokenStore, TokenStore};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method as http_method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, store: Arc<InMemoryTokenStore>) -> IdentityProvider {
        let config = VitrineConfig::new().with_api_host(server.uri());
        IdentityProvider::new(&config, store).unwrap()
    }

    async fn mount_me(server: &MockServer, token: &str) {
        Mock::given(http_method("GET"))
            .and(path("/auth/users/me"))
            .and(header("Authorization", format!("Bearer {token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "login": "admin"})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_sign_in_extracts_tokens_and_user() {
        let server = MockServer::start().await;
        Mock::given(http_method("POST"))
            .and(path("/auth/login"))
            .and(header("X-AD-OS", "Web"))
            .and(header("X-Ad-Locale", "ru"))
            .and(body_json(json!({"login": "admin", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"access_token": "abc", "refresh_token": "r1"}),
            ))
            .mount(&server)
            .await;
        mount_me(&server, "abc").await;

        let store = Arc::new(InMemoryTokenStore::new());
        let provider = provider(&server, store.clone());
        let token = provider.sign_in(&Credentials::new("admin", "pw")).await.unwrap();

        assert_eq!(token.value, "abc");
        let state = provider.state();
        assert_eq!(state.status, SessionStatus::Authenticated);
        assert_eq!(state.user.unwrap().login.as_deref(), Some("admin"));

        let stored = store.load().await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_sign_in_failure_restores_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(http_method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "Wrong password"})),
            )
            .mount(&server)
            .await;

        let provider = provider(&server, Arc::new(InMemoryTokenStore::new()));
        let err = provider
            .sign_in(&Credentials::new("admin", "bad"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SessionError::Backend { status: 400, message: Some(ref m) } if m == "Wrong password"
        ));
        assert_eq!(provider.state().status, SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_sign_in_without_token_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(http_method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let provider = provider(&server, Arc::new(InMemoryTokenStore::new()));
        let err = provider
            .sign_in(&Credentials::new("admin", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::MalformedResponse(_)));
        assert!(provider.access_token().is_none());
    }

    #[tokio::test]
    async fn test_refresh_reads_root_string_and_keeps_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(http_method("POST"))
            .and(path("/auth/refresh"))
            .and(body_json(json!({"refresh_token": "r1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("xyz")))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryTokenStore::with_tokens(StoredTokens::issued(
            "abc",
            Duration::from_secs(1800),
            Some("r1"),
            Duration::from_secs(60),
        )));
        let provider = provider(&server, store.clone());
        let token = provider.refresh().await.unwrap();

        assert_eq!(token.value, "xyz");
        assert_eq!(provider.state().status, SessionStatus::Authenticated);
        let stored = store.load().await.unwrap().unwrap();
        assert_eq!(stored.access_token.as_deref(), Some("xyz"));
        assert_eq!(stored.refresh_token.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_refresh_rotates_refresh_token_from_object() {
        let server = MockServer::start().await;
        Mock::given(http_method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"access_token": "xyz", "refresh_token": "r2"}),
            ))
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryTokenStore::with_tokens(StoredTokens::issued(
            "abc",
            Duration::from_secs(1800),
            Some("r1"),
            Duration::from_secs(60),
        )));
        let provider = provider(&server, store.clone());
        assert_eq!(provider.refresh().await.unwrap().value, "xyz");
        let stored = store.load().await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let server = MockServer::start().await;
        let provider = provider(&server, Arc::new(InMemoryTokenStore::new()));
        assert!(matches!(
            provider.refresh().await,
            Err(SessionError::NoRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_generation_increases_per_token() {
        let server = MockServer::start().await;
        Mock::given(http_method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("next")))
            .mount(&server)
            .await;
        let store = Arc::new(InMemoryTokenStore::with_tokens(StoredTokens::issued(
            "abc",
            Duration::from_secs(1800),
            Some("r1"),
            Duration::from_secs(60),
        )));
        let provider = provider(&server, store);

        let first = provider.refresh().await.unwrap();
        let second = provider.refresh().await.unwrap();
        assert!(second.generation > first.generation);
    }

    #[tokio::test]
    async fn test_sign_out_clears_even_when_endpoint_fails() {
        let server = MockServer::start().await;
        Mock::given(http_method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryTokenStore::new());
        let provider = provider(&server, store.clone());
        provider.install("abc".to_string(), None, None);

        assert!(provider.sign_out().await.unwrap());
        assert_eq!(provider.state(), AuthState::default());
        assert!(store.load().await.unwrap().is_none());

        // Second sign-out has nothing to clear and makes no request.
        assert!(!provider.sign_out().await.unwrap());
    }

    #[tokio::test]
    async fn test_restore_with_valid_access_token() {
        let server = MockServer::start().await;
        mount_me(&server, "abc").await;

        let store = Arc::new(InMemoryTokenStore::with_tokens(StoredTokens::issued(
            "abc",
            Duration::from_secs(1800),
            Some("r1"),
            Duration::from_secs(60),
        )));
        let provider = provider(&server, store);
        assert_eq!(provider.restore().await.unwrap(), Restored::Authenticated);
        assert!(provider.state().user.is_some());
    }

    #[tokio::test]
    async fn test_restore_rejected_token_needs_refresh() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/auth/users/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryTokenStore::with_tokens(StoredTokens::issued(
            "stale",
            Duration::from_secs(1800),
            Some("r1"),
            Duration::from_secs(60),
        )));
        let provider = provider(&server, store);
        assert_eq!(provider.restore().await.unwrap(), Restored::NeedsRefresh);
        assert_eq!(provider.state().status, SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_missing_host_is_config_error() {
        let provider = IdentityProvider::new(
            &VitrineConfig::new(),
            Arc::new(InMemoryTokenStore::new()),
        )
        .unwrap();
        let err = provider
            .sign_in(&Credentials::new("a", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("admin", "secret"));
        assert!(debug.contains("admin"));
        assert!(!debug.contains("secret"));
    }
}
