//! Navigation targets for session transitions, and the login-page route guard.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::state::SessionStatus;

/// Receives navigation requests issued by the session layer
/// (`/login` after sign-out, the callback URL after sign-in).
pub trait Navigator: Send + Sync + std::fmt::Debug {
    fn navigate(&self, target: &str);
}

/// Shared navigator handle.
pub type SharedNavigator = Arc<dyn Navigator>;

/// Navigator that logs the target and remembers the history.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent navigation target.
    pub fn current(&self) -> Option<String> {
        self.history.lock().last().cloned()
    }

    /// Every target navigated to, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str) {
        tracing::debug!(target, "Navigating");
        self.history.lock().push(target.to_string());
    }
}

/// Redirect rule for page navigation: an authenticated user visiting the
/// login page is sent home. Everything else is allowed through.
pub fn guard(status: SessionStatus, path: &str, login_page: &str) -> Option<&'static str> {
    (status == SessionStatus::Authenticated && path == login_page).then_some("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_navigator() {
        let nav = RecordingNavigator::new();
        assert!(nav.current().is_none());
        nav.navigate("/");
        nav.navigate("/login");
        assert_eq!(nav.current().as_deref(), Some("/login"));
        assert_eq!(nav.history(), vec!["/", "/login"]);
    }

    #[test]
    fn test_guard() {
        assert_eq!(guard(SessionStatus::Authenticated, "/login", "/login"), Some("/"));
        assert_eq!(guard(SessionStatus::Authenticated, "/brands", "/login"), None);
        assert_eq!(guard(SessionStatus::Unauthenticated, "/login", "/login"), None);
        assert_eq!(guard(SessionStatus::Loading, "/login", "/login"), None);
    }
}
