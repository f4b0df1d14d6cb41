//! Session state types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authentication status of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Unauthenticated,
    Authenticated,
    Loading,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Unauthenticated => write!(f, "unauthenticated"),
            SessionStatus::Authenticated => write!(f, "authenticated"),
            SessionStatus::Loading => write!(f, "loading"),
        }
    }
}

/// Identity record returned by the "current session" endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Remaining identity fields, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    /// Best-effort display name.
    pub fn display_name(&self) -> String {
        self.login
            .clone()
            .or_else(|| self.email.clone())
            .or_else(|| self.id.as_ref().map(|id| id.to_string()))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// An access token held in memory.
///
/// `generation` increases every time a new token is installed, so a request
/// can tell whether the token it was sent with has since been replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub generation: u64,
}

impl AccessToken {
    /// True when the expiry is known and has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

/// Identity-provider side state, broadcast to subscribers on every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub status: SessionStatus,
    pub user: Option<User>,
    pub access_token: Option<AccessToken>,
}

impl AuthState {
    pub(crate) fn authenticated(token: AccessToken, user: Option<User>) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            user,
            access_token: Some(token),
        }
    }
}

/// Read-only projection of the session exposed to the rest of the application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub status: SessionStatus,
    pub user: Option<User>,
    pub is_authenticated: bool,
}

impl SessionView {
    /// Recompute the projection from provider state.
    ///
    /// `user` is only exposed while authenticated, and a known-expired token
    /// does not count as authenticated.
    pub fn project(state: &AuthState) -> Self {
        let token_valid = state
            .access_token
            .as_ref()
            .is_some_and(|token| !token.is_expired());
        let is_authenticated = state.status == SessionStatus::Authenticated && token_valid;

        Self {
            status: state.status,
            user: if is_authenticated {
                state.user.clone()
            } else {
                None
            },
            is_authenticated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_in: i64) -> AccessToken {
        AccessToken {
            value: "abc".to_string(),
            expires_at: Some(Utc::now() + chrono::Duration::seconds(expires_in)),
            generation: 1,
        }
    }

    fn user() -> User {
        serde_json::from_value(serde_json::json!({"id": 7, "login": "admin", "role": "owner"}))
            .unwrap()
    }

    #[test]
    fn test_user_keeps_unknown_fields() {
        let user = user();
        assert_eq!(user.login.as_deref(), Some("admin"));
        assert_eq!(user.extra["role"], "owner");
        assert_eq!(user.display_name(), "admin");
    }

    #[test]
    fn test_projection_authenticated() {
        let view = SessionView::project(&AuthState::authenticated(token(60), Some(user())));
        assert!(view.is_authenticated);
        assert_eq!(view.status, SessionStatus::Authenticated);
        assert!(view.user.is_some());
    }

    #[test]
    fn test_projection_hides_user_when_token_expired() {
        let view = SessionView::project(&AuthState::authenticated(token(-1), Some(user())));
        assert!(!view.is_authenticated);
        assert!(view.user.is_none());
    }

    #[test]
    fn test_projection_unauthenticated() {
        let view = SessionView::project(&AuthState::default());
        assert_eq!(view.status, SessionStatus::Unauthenticated);
        assert!(!view.is_authenticated);
        assert!(view.user.is_none());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SessionStatus::Loading.to_string(), "loading");
        assert_eq!(
            serde_json::to_string(&SessionStatus::Authenticated).unwrap(),
            "\"authenticated\""
        );
    }
}
