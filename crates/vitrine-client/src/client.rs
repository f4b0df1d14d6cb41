//! Main client implementation.
//!
//! Every call goes through [`VitrineClient::request`], which attaches the
//! standard and bearer headers, reports the response to the optional hook, and
//! on a 401 joins the session's single-flight refresh before retrying once.
//! If the refresh fails the session is signed out and the original error is
//! returned.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use tracing::{Instrument, debug, warn};
use url::Url;
use uuid::Uuid;
use vitrine_config::{API_HOST_ENV, ConfigError, HeaderConfig, VitrineConfig};
use vitrine_session::{AccessToken, SessionStore};

use crate::api::{
    BrandsApi, CategoriesApi, CharacteristicsApi, ProductsApi, SubcategoriesApi, TagsApi,
};
use crate::cache::{CacheMode, ResponseCache};
use crate::error::{Error, Result};
use crate::hook::{ResponseContext, ResponseHook};
use crate::request::{Body, RequestOptions, RequestTarget};
use crate::response::ApiResponse;

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated client for the catalog API.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use vitrine_client::{RequestOptions, VitrineClient};
/// use vitrine_config::VitrineConfig;
/// use vitrine_session::{RecordingNavigator, SessionStore, create_memory_token_store};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = VitrineConfig::new().with_api_host("https://api.example.com");
/// let session = Arc::new(SessionStore::from_config(
///     &config,
///     create_memory_token_store(),
///     Arc::new(RecordingNavigator::new()),
/// )?);
/// let client = VitrineClient::from_config(&config, session)?;
///
/// let brands = client
///     .request("/brands/", RequestOptions::get(), Default::default(), true)
///     .await?;
/// println!("{}", brands.text());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct VitrineClient {
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
struct ClientInner {
    http: reqwest::Client,
    base_url: Option<Url>,
    standard_headers: HeaderMap,
    auth_header: HeaderName,
    timeout: Duration,
    session: Arc<SessionStore>,
    hook: Option<Arc<dyn ResponseHook>>,
    cache: ResponseCache,
}

impl std::fmt::Debug for VitrineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VitrineClient")
            .field("base_url", &self.inner.base_url)
            .field("timeout", &self.inner.timeout)
            .field("has_hook", &self.inner.hook.is_some())
            .finish()
    }
}

impl VitrineClient {
    /// Create a new client builder.
    pub fn builder(session: Arc<SessionStore>) -> ClientBuilder {
        ClientBuilder::new(session)
    }

    /// Create a client from loaded configuration.
    pub fn from_config(config: &VitrineConfig, session: Arc<SessionStore>) -> Result<Self> {
        ClientBuilder::from_config(config, session).build()
    }

    /// The API base, if configured.
    pub fn base_url(&self) -> Option<&Url> {
        self.inner.base_url.as_ref()
    }

    /// The session this client authenticates with.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    /// The GET response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the brands API.
    pub fn brands(&self) -> BrandsApi {
        BrandsApi::new(self.clone())
    }

    /// Access the categories API.
    pub fn categories(&self) -> CategoriesApi {
        CategoriesApi::new(self.clone())
    }

    /// Access the subcategories API.
    pub fn subcategories(&self) -> SubcategoriesApi {
        SubcategoriesApi::new(self.clone())
    }

    /// Access the products API.
    pub fn products(&self) -> ProductsApi {
        ProductsApi::new(self.clone())
    }

    /// Access the tags API.
    pub fn tags(&self) -> TagsApi {
        TagsApi::new(self.clone())
    }

    /// Access the characteristics API.
    pub fn characteristics(&self) -> CharacteristicsApi {
        CharacteristicsApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request pipeline
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue an authenticated request.
    ///
    /// `extra_headers` override the standard headers on collision; the
    /// authorization header is applied last. With `bypass_cache` the response
    /// is neither read from nor written to the response cache.
    ///
    /// Fails with [`Error::Config`] before any network activity when the API
    /// base is not configured.
    pub async fn request(
        &self,
        target: impl Into<RequestTarget>,
        options: RequestOptions,
        extra_headers: HeaderMap,
        bypass_cache: bool,
    ) -> Result<ApiResponse> {
        let base = self.require_base_url()?;
        let path = target.into().resolve()?;
        let url = endpoint_url(base, &path, &options.query)?;

        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "api_request",
            %request_id,
            method = %options.method,
            path = %path
        );

        self.execute(request_id, url, options, extra_headers, bypass_cache)
            .instrument(span)
            .await
    }

    async fn execute(
        &self,
        request_id: Uuid,
        url: Url,
        options: RequestOptions,
        extra_headers: HeaderMap,
        bypass_cache: bool,
    ) -> Result<ApiResponse> {
        let mode = cache_mode(&options.method, &url, bypass_cache);
        if let CacheMode::Bypass { key } = &mode {
            debug!(cache_key = %key, "Bypassing response cache");
        }
        let owner = self
            .inner
            .session
            .provider()
            .access_token()
            .map(|t| t.generation);
        if self.inner.cache.scope_to(owner) {
            debug!(?owner, "Token changed; response cache reset");
        }
        if let Some(hit) = self.inner.cache.get(&mode) {
            debug!("Served from response cache");
            return Ok(hit);
        }

        let mut attempt = 1;
        loop {
            let token = self.inner.session.provider().access_token();
            let headers = self.headers_for(&extra_headers, token.as_ref())?;

            debug!(attempt, authenticated = token.is_some(), "Sending request");
            let response = ApiResponse::read(self.send(&url, &options, headers).await?).await?;
            self.notify(request_id, &options.method, &url, response.status(), attempt);

            let status = response.status();
            if status.is_success() {
                self.remember(&mode, &options.method, &response);
                return Ok(response);
            }

            let error = Error::from_response(status.as_u16(), response.bytes());
            if status != StatusCode::UNAUTHORIZED {
                return Err(error);
            }
            if attempt > 1 {
                warn!("Request rejected again after token refresh");
                return Err(error);
            }

            let seen = token.as_ref().map(|t| t.generation);
            match self
                .inner
                .session
                .coordinator()
                .ensure_refreshed_after(seen)
                .await
            {
                Ok(fresh) => {
                    debug!(generation = fresh.generation, "Retrying with refreshed token");
                    attempt += 1;
                }
                Err(failure) => {
                    warn!(reason = %failure.reason, "Session could not be refreshed");
                    self.inner.session.force_sign_out().await;
                    self.inner.cache.clear();
                    return Err(error);
                }
            }
        }
    }

    fn require_base_url(&self) -> Result<&Url> {
        self.inner.base_url.as_ref().ok_or_else(|| {
            Error::Config(ConfigError::MissingApiHost {
                env_var: API_HOST_ENV.to_string(),
            })
        })
    }

    /// Standard headers, then caller headers, then the authorization header.
    fn headers_for(&self, extra: &HeaderMap, token: Option<&AccessToken>) -> Result<HeaderMap> {
        let mut headers = self.inner.standard_headers.clone();
        headers.extend(extra.clone());

        if let Some(token) = token {
            let value = self.inner.session.provider().auth_header_value(token);
            let value = HeaderValue::from_str(&value).map_err(|_| {
                Error::InvalidRequest("access token is not a valid header value".to_string())
            })?;
            headers.insert(self.inner.auth_header.clone(), value);
        }
        Ok(headers)
    }

    async fn send(
        &self,
        url: &Url,
        options: &RequestOptions,
        headers: HeaderMap,
    ) -> Result<reqwest::Response> {
        let builder = self
            .inner
            .http
            .request(options.method.clone(), url.clone())
            .headers(headers)
            .timeout(self.inner.timeout);

        let builder = match &options.body {
            Some(Body::Json(value)) => builder.json(value),
            Some(Body::Form(form)) => builder.multipart(form.to_multipart()?),
            None => builder,
        };

        Ok(builder.send().await?)
    }

    fn notify(&self, request_id: Uuid, method: &Method, url: &Url, status: StatusCode, attempt: u32) {
        if let Some(hook) = &self.inner.hook {
            hook.on_response(&ResponseContext {
                request_id,
                method,
                url,
                status,
                attempt,
            });
        }
    }

    /// Store cacheable responses; successful writes invalidate the cache.
    fn remember(&self, mode: &CacheMode, method: &Method, response: &ApiResponse) {
        if *method == Method::GET {
            self.inner.cache.put(mode, response);
        } else if !self.inner.cache.is_empty() {
            debug!("Write succeeded; clearing response cache");
            self.inner.cache.clear();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers for the API modules
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) async fn call<T: serde::de::DeserializeOwned>(
        &self,
        path: impl Into<RequestTarget>,
        options: RequestOptions,
        bypass_cache: bool,
    ) -> Result<T> {
        self.request(path, options, HeaderMap::new(), bypass_cache)
            .await?
            .json()
    }

    pub(crate) async fn call_empty(
        &self,
        path: impl Into<RequestTarget>,
        options: RequestOptions,
    ) -> Result<()> {
        self.request(path, options, HeaderMap::new(), false).await?;
        Ok(())
    }
}

/// Join an API path onto the base and append the query.
fn endpoint_url(base: &Url, path: &str, query: &[(String, String)]) -> Result<Url> {
    let mut url = base.join(path.trim_start_matches('/'))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

fn cache_mode(method: &Method, url: &Url, bypass: bool) -> CacheMode {
    if bypass {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        CacheMode::Bypass {
            key: format!("{}-{}-{}", url, millis, Uuid::new_v4()),
        }
    } else if *method == Method::GET {
        CacheMode::Shared {
            key: format!("{} {}", method, url),
        }
    } else {
        CacheMode::Off
    }
}

fn standard_headers(config: &HeaderConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in config.standard() {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "headers".to_string(),
                reason: format!("invalid header name '{}': {}", name, e),
            }
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidValue {
            field: "headers".to_string(),
            reason: format!("invalid value for '{}': {}", name, e),
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Builder for creating a [`VitrineClient`].
pub struct ClientBuilder {
    session: Arc<SessionStore>,
    api_host: Option<String>,
    headers: HeaderConfig,
    timeout: Duration,
    cache_ttl: Option<Duration>,
    hook: Option<Arc<dyn ResponseHook>>,
    user_agent: Option<String>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("api_host", &self.api_host)
            .field("timeout", &self.timeout)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self {
            session,
            api_host: None,
            headers: HeaderConfig::default(),
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: None,
            hook: None,
            user_agent: None,
        }
    }

    /// Create a builder populated from configuration.
    pub fn from_config(config: &VitrineConfig, session: Arc<SessionStore>) -> Self {
        Self {
            api_host: config.api.host.clone(),
            headers: config.headers.clone(),
            timeout: config.api.timeout(),
            cache_ttl: config.cache.ttl(),
            ..Self::new(session)
        }
    }

    /// Set the API base.
    pub fn api_host(mut self, host: impl Into<String>) -> Self {
        self.api_host = Some(host.into());
        self
    }

    /// Set the standard headers.
    pub fn headers(mut self, headers: HeaderConfig) -> Self {
        self.headers = headers;
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable the GET response cache with the given TTL.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = (!ttl.is_zero()).then_some(ttl);
        self
    }

    /// Install a response hook.
    pub fn response_hook(mut self, hook: impl ResponseHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    ///
    /// A missing API host is not an error here; it is reported by every
    /// request instead.
    pub fn build(self) -> Result<VitrineClient> {
        let base_url = match self.api_host.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => {
                let mut base_url = Url::parse(host)?;
                if !base_url.path().ends_with('/') {
                    base_url.set_path(&format!("{}/", base_url.path()));
                }
                Some(base_url)
            }
            _ => None,
        };

        let auth_header = self.session.provider().auth_header_name();
        let auth_header = HeaderName::from_bytes(auth_header.as_bytes()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "auth.token.header_name".to_string(),
                reason: e.to_string(),
            }
        })?;

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("vitrine-client/{}", env!("CARGO_PKG_VERSION")));
        let http = reqwest::Client::builder().user_agent(user_agent).build()?;

        Ok(VitrineClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                standard_headers: standard_headers(&self.headers)?,
                auth_header,
                timeout: self.timeout,
                session: self.session,
                hook: self.hook,
                cache: ResponseCache::new(self.cache_ttl),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_session::{RecordingNavigator, create_memory_token_store};

    fn session() -> Arc<SessionStore> {
        let config = VitrineConfig::new();
        Arc::new(
            SessionStore::from_config(
                &config,
                create_memory_token_store(),
                Arc::new(RecordingNavigator::new()),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_builder_normalizes_trailing_slash() {
        let client = ClientBuilder::new(session())
            .api_host("http://localhost:8080/api")
            .build()
            .unwrap();

        assert_eq!(client.base_url().unwrap().as_str(), "http://localhost:8080/api/");
    }

    #[test]
    fn test_builder_without_host_defers_error() {
        let client = ClientBuilder::new(session()).build().unwrap();
        assert!(client.base_url().is_none());
        assert!(client.require_base_url().unwrap_err().is_config_error());
    }

    #[test]
    fn test_builder_rejects_invalid_host() {
        let result = ClientBuilder::new(session()).api_host("not a url").build();
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_url_building() {
        let base = Url::parse("http://localhost:8080/api/").unwrap();

        let url = endpoint_url(&base, "/brands/", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/brands/");

        let query = vec![
            ("page".to_string(), "2".to_string()),
            ("limit".to_string(), "10".to_string()),
        ];
        let url = endpoint_url(&base, "tags/", &query).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/tags/?page=2&limit=10");
    }

    #[test]
    fn test_header_merge_order() {
        let client = ClientBuilder::new(session())
            .api_host("http://localhost")
            .build()
            .unwrap();

        let mut extra = HeaderMap::new();
        extra.insert("x-ad-locale", HeaderValue::from_static("en"));
        extra.insert("authorization", HeaderValue::from_static("Basic spoofed"));

        let token = AccessToken {
            value: "abc".to_string(),
            expires_at: None,
            generation: 1,
        };
        let headers = client.headers_for(&extra, Some(&token)).unwrap();

        assert_eq!(headers["X-AD-OS"], "Web");
        assert_eq!(headers["X-Ad-Locale"], "en");
        assert_eq!(headers["Authorization"], "Bearer abc");
        assert_eq!(headers.get_all("authorization").iter().count(), 1);

        let anonymous = client.headers_for(&HeaderMap::new(), None).unwrap();
        assert!(anonymous.get("authorization").is_none());
        assert_eq!(anonymous["x-ad-locale"], "ru");
    }

    #[test]
    fn test_cache_modes() {
        let url = Url::parse("http://localhost/tags/?page=1").unwrap();

        assert_eq!(
            cache_mode(&Method::GET, &url, false),
            CacheMode::Shared {
                key: "GET http://localhost/tags/?page=1".to_string()
            }
        );
        assert_eq!(cache_mode(&Method::POST, &url, false), CacheMode::Off);

        let a = cache_mode(&Method::GET, &url, true);
        let b = cache_mode(&Method::GET, &url, true);
        assert!(matches!(a, CacheMode::Bypass { .. }));
        assert_ne!(a.key(), b.key());
        assert!(a.key().unwrap().starts_with("http://localhost/tags/?page=1-"));
    }

    #[test]
    fn test_invalid_standard_header_is_config_error() {
        let headers = HeaderConfig {
            platform_header: "bad header".to_string(),
            ..Default::default()
        };
        let result = ClientBuilder::new(session()).headers(headers).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
