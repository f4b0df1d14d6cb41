//! Response hook invoked on every response the client receives.

use reqwest::{Method, StatusCode};
use url::Url;
use uuid::Uuid;

/// What a hook sees about one response.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    pub request_id: Uuid,
    pub method: &'a Method,
    pub url: &'a Url,
    pub status: StatusCode,
    /// 1 for the first attempt, 2 for the retry after a token refresh.
    pub attempt: u32,
}

/// Cross-cutting observer of responses, injected at construction.
///
/// Runs for error responses too, before the client decides what to do with
/// them.
pub trait ResponseHook: Send + Sync {
    fn on_response(&self, context: &ResponseContext<'_>);
}

/// Hook that records each response as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHook;

impl ResponseHook for TracingHook {
    fn on_response(&self, context: &ResponseContext<'_>) {
        tracing::debug!(
            request_id = %context.request_id,
            method = %context.method,
            url = %context.url,
            status = context.status.as_u16(),
            attempt = context.attempt,
            "Response received"
        );
    }
}
