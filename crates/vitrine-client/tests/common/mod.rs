//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use vitrine_client::VitrineClient;
use vitrine_config::VitrineConfig;
use vitrine_session::{Credentials, RecordingNavigator, SessionStore, create_memory_token_store};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A mock catalog API plus a client and session wired to it.
pub struct TestApi {
    pub server: MockServer,
    pub navigator: Arc<RecordingNavigator>,
    pub session: Arc<SessionStore>,
    pub client: VitrineClient,
}

impl TestApi {
    /// Start with default configuration and no session.
    pub async fn start() -> Result<Self> {
        Self::start_with(|_| {}).await
    }

    /// Start with configuration adjusted by `configure`.
    pub async fn start_with(configure: impl FnOnce(&mut VitrineConfig)) -> Result<Self> {
        let server = MockServer::start().await;
        let mut config = VitrineConfig::new().with_api_host(server.uri());
        configure(&mut config);

        let navigator = Arc::new(RecordingNavigator::new());
        let session = Arc::new(SessionStore::from_config(
            &config,
            create_memory_token_store(),
            navigator.clone(),
        )?);
        let client = VitrineClient::from_config(&config, Arc::clone(&session))?;

        Ok(Self {
            server,
            navigator,
            session,
            client,
        })
    }

    /// Start and sign in, holding `access` / `refresh` tokens.
    pub async fn signed_in(access: &str, refresh: &str) -> Result<Self> {
        let api = Self::start().await?;
        api.sign_in(access, refresh).await?;
        Ok(api)
    }

    /// Mount the identity endpoints and sign in.
    pub async fn sign_in(&self, access: &str, refresh: &str) -> Result<()> {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access,
                "refresh_token": refresh,
            })))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/users/me"))
            .and(header("Authorization", format!("Bearer {}", access).as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"user": {"id": 1, "login": "admin"}})),
            )
            .mount(&self.server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.server)
            .await;

        self.session
            .login(&Credentials::new("admin", "secret"), "/")
            .await?;
        Ok(())
    }

    /// Mount the refresh endpoint, expecting exactly `times` calls.
    pub async fn mount_refresh(&self, response: ResponseTemplate, times: u64) {
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(response)
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Requests the server saw for `path`, in arrival order.
    pub async fn requests_to(&self, request_path: &str) -> Vec<wiremock::Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == request_path)
            .collect()
    }
}

/// The `Authorization` header of a received request, if any.
pub fn authorization(request: &wiremock::Request) -> Option<String> {
    request
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
