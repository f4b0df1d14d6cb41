//! Single-flight token refresh.
//!
//! At most one refresh round trip runs at a time. The first caller that needs
//! a refresh spawns it as its own task and parks a shared handle in the
//! in-flight slot; everyone arriving while it runs awaits that same handle and
//! observes the same outcome. The task clears the slot when it settles, so a
//! failed attempt never blocks the next one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::provider::IdentityProvider;
use crate::state::AccessToken;

/// Uniform failure signal fanned out to every waiter of a refresh.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("token refresh failed: {reason}")]
pub struct RefreshFailure {
    pub reason: String,
    pub timed_out: bool,
}

impl RefreshFailure {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            timed_out: false,
        }
    }
}

/// Outcome shared by all waiters of one refresh.
pub type RefreshOutcome = std::result::Result<AccessToken, RefreshFailure>;

type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Coordinates access-token refreshes.
pub struct RefreshCoordinator {
    provider: Arc<IdentityProvider>,
    timeout: Duration,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    started: AtomicU64,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("timeout", &self.timeout)
            .field("refreshing", &self.is_refreshing())
            .field("started", &self.refresh_count())
            .finish()
    }
}

impl RefreshCoordinator {
    /// Create a coordinator; every refresh is bounded by `timeout`.
    pub fn new(provider: Arc<IdentityProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            in_flight: Arc::new(Mutex::new(None)),
            started: AtomicU64::new(0),
        }
    }

    /// The provider this coordinator refreshes through.
    pub fn provider(&self) -> &Arc<IdentityProvider> {
        &self.provider
    }

    /// Number of refresh round trips started so far.
    pub fn refresh_count(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    /// Whether a refresh is currently running.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    /// Refresh the access token, joining a refresh already in flight.
    pub async fn ensure_refreshed(&self) -> RefreshOutcome {
        self.ensure_refreshed_after(None).await
    }

    /// Like [`ensure_refreshed`](Self::ensure_refreshed), for a caller whose
    /// request was rejected while carrying the token of `seen_generation`.
    ///
    /// If a newer token has been installed since, it is returned without
    /// another round trip.
    pub async fn ensure_refreshed_after(&self, seen_generation: Option<u64>) -> RefreshOutcome {
        let in_flight = {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some(existing) => {
                    debug!("Joining in-flight token refresh");
                    existing.clone()
                }
                None => {
                    if let Some(current) = self.newer_token(seen_generation) {
                        debug!(
                            generation = current.generation,
                            "Token already replaced; skipping refresh"
                        );
                        return Ok(current);
                    }
                    let started = self.start();
                    *slot = Some(started.clone());
                    started
                }
            }
        };

        in_flight.await
    }

    fn newer_token(&self, seen_generation: Option<u64>) -> Option<AccessToken> {
        let seen = seen_generation?;
        self.provider
            .access_token()
            .filter(|token| token.generation > seen)
    }

    /// Spawn the refresh task. Must be called with the slot locked.
    fn start(&self) -> InFlight {
        let attempt = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        let provider = Arc::clone(&self.provider);
        let slot = Arc::clone(&self.in_flight);
        let timeout = self.timeout;

        let task = tokio::spawn(async move {
            debug!(attempt, "Starting token refresh");
            let outcome = match tokio::time::timeout(timeout, provider.refresh()).await {
                Ok(Ok(token)) => {
                    info!(attempt, generation = token.generation, "Token refreshed");
                    Ok(token)
                }
                Ok(Err(e)) => {
                    warn!(attempt, error = %e, "Token refresh failed");
                    Err(RefreshFailure::new(e.to_string()))
                }
                Err(_) => {
                    warn!(attempt, ?timeout, "Token refresh timed out");
                    Err(RefreshFailure {
                        reason: format!("no response within {:?}", timeout),
                        timed_out: true,
                    })
                }
            };
            slot.lock().take();
            outcome
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(RefreshFailure::new(format!("refresh task aborted: {}", e)))
            })
        }
        .boxed()
        .shared()
    }
}
