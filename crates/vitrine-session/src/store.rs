//! Session store.
//!
//! Exposes a read-only projection of the session (`status`, `user`,
//! `is_authenticated`, `is_loading`) plus the login/logout/refresh operations.
//! The store holds an explicit subscription to the identity provider's state
//! channel and recomputes the projection on read when that state has changed;
//! it is never written back. [`SessionStore::detach`] drops the subscription.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use vitrine_config::VitrineConfig;

use crate::error::{Result, SessionError};
use crate::navigate::SharedNavigator;
use crate::provider::{Credentials, IdentityProvider, Restored};
use crate::refresh::{RefreshCoordinator, RefreshOutcome};
use crate::state::{AccessToken, AuthState, SessionStatus, SessionView, User};
use crate::tokens::SharedTokenStore;

/// Message used when a login failure carries no usable description.
pub const DEFAULT_LOGIN_ERROR: &str = "Login failed";

struct Projection {
    updates: Option<watch::Receiver<AuthState>>,
    view: SessionView,
}

/// Application-facing session state and operations.
pub struct SessionStore {
    provider: Arc<IdentityProvider>,
    coordinator: Arc<RefreshCoordinator>,
    navigator: SharedNavigator,
    login_page: String,
    projection: Mutex<Projection>,
    loading: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("view", &self.view())
            .field("loading", &self.is_loading())
            .finish()
    }
}

impl SessionStore {
    /// Create a store on top of a refresh coordinator and its provider.
    pub fn new(coordinator: Arc<RefreshCoordinator>, navigator: SharedNavigator) -> Self {
        let provider = Arc::clone(coordinator.provider());
        let mut updates = provider.subscribe();
        let view = SessionView::project(&updates.borrow_and_update());

        Self {
            login_page: provider.auth_config().login_page.clone(),
            provider,
            coordinator,
            navigator,
            projection: Mutex::new(Projection {
                updates: Some(updates),
                view,
            }),
            loading: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    /// Build the provider, coordinator and store from config.
    pub fn from_config(
        config: &VitrineConfig,
        tokens: SharedTokenStore,
        navigator: SharedNavigator,
    ) -> Result<Self> {
        let provider = Arc::new(IdentityProvider::new(config, tokens)?);
        let coordinator = Arc::new(RefreshCoordinator::new(
            provider,
            config.session.refresh_timeout(),
        ));
        Ok(Self::new(coordinator, navigator))
    }

    pub fn provider(&self) -> &Arc<IdentityProvider> {
        &self.provider
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    pub fn login_page(&self) -> &str {
        &self.login_page
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Projection
    // ─────────────────────────────────────────────────────────────────────────

    /// Current projection, recomputed if the provider state changed.
    pub fn view(&self) -> SessionView {
        let mut projection = self.projection.lock();
        let Projection { updates, view } = &mut *projection;
        if let Some(updates) = updates
            && updates.has_changed().unwrap_or(false)
        {
            *view = SessionView::project(&updates.borrow_and_update());
        }
        view.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.view().status
    }

    pub fn user(&self) -> Option<User> {
        self.view().user
    }

    pub fn is_authenticated(&self) -> bool {
        self.view().is_authenticated
    }

    /// True while a login is pending.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Message of the most recent failed login.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// Tear down the subscription. The projection keeps its last value.
    pub fn detach(&self) {
        if self.projection.lock().updates.take().is_some() {
            debug!("Session projection detached from identity provider");
        }
    }

    /// Whether a refresh could keep the session alive: an access token is held
    /// (possibly expired) or a refresh token is persisted.
    pub async fn can_refresh(&self) -> bool {
        self.provider.access_token().is_some() || self.provider.has_refresh_token().await
    }

    /// Current access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.provider.access_token().map(|t| t.value)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign in and navigate to `callback_url`.
    ///
    /// Any failure is normalised into [`SessionError::Login`] carrying one
    /// human-readable message, which is also kept in [`last_error`](Self::last_error).
    pub async fn login(&self, credentials: &Credentials, callback_url: &str) -> Result<AccessToken> {
        let _loading = LoadingGuard::set(&self.loading);
        *self.last_error.lock() = None;

        match self.provider.sign_in(credentials).await {
            Ok(token) => {
                self.navigator.navigate(callback_url);
                Ok(token)
            }
            Err(e) => {
                let message = login_message(&e);
                warn!(error = %e, "Login failed");
                *self.last_error.lock() = Some(message.clone());
                Err(SessionError::Login(message))
            }
        }
    }

    /// Sign out and navigate to the login page.
    pub async fn logout(&self) -> Result<()> {
        self.provider.sign_out().await?;
        self.navigator.navigate(&self.login_page);
        Ok(())
    }

    /// Refresh through the coordinator, logging out if the refresh fails.
    pub async fn refresh_token(&self) -> RefreshOutcome {
        let outcome = self.coordinator.ensure_refreshed().await;
        if let Err(failure) = &outcome {
            warn!(reason = %failure.reason, "Refresh failed; logging out");
            if let Err(e) = self.logout().await {
                warn!(error = %e, "Logout after failed refresh did not complete");
            }
        }
        outcome
    }

    /// Unconditional transition to unauthenticated plus redirect to the login
    /// page. Safe to call from many waiters at once.
    pub async fn force_sign_out(&self) {
        match self.provider.sign_out().await {
            Ok(true) => warn!("Session could not be recovered; signed out"),
            Ok(false) => debug!("Forced sign-out with no active session"),
            Err(e) => warn!(error = %e, "Failed to clear persisted tokens"),
        }
        self.navigator.navigate(&self.login_page);
    }

    /// Restore a persisted session at startup.
    pub async fn restore(&self) -> Result<SessionStatus> {
        match self.provider.restore().await? {
            Restored::Authenticated => {}
            Restored::NeedsRefresh => match self.coordinator.ensure_refreshed().await {
                Ok(_) => {
                    self.provider.fetch_session().await?;
                }
                Err(failure) => {
                    info!(reason = %failure.reason, "Persisted session expired");
                    self.provider.sign_out().await?;
                }
            },
            Restored::Empty => {}
        }
        Ok(self.status())
    }
}

/// Prefer the server's structured message, then the error's own text, then
/// the default.
fn login_message(error: &SessionError) -> String {
    if let SessionError::Backend {
        message: Some(message),
        ..
    } = error
        && !message.trim().is_empty()
    {
        return message.clone();
    }

    let text = error.to_string();
    if text.trim().is_empty() {
        DEFAULT_LOGIN_ERROR.to_string()
    } else {
        text
    }
}

/// Clears the loading flag on every exit path.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
