//! Session layer for the Vitrine admin client.
//!
//! Owns everything about "who is signed in": talking to the identity provider,
//! persisting token material, coalescing concurrent token refreshes, and
//! exposing a read-only session projection to the rest of the application.
//!
//! # Components
//!
//! - [`provider`] - Identity-provider client: sign-in, sign-out, session fetch, refresh
//! - [`refresh`] - Single-flight refresh coordinator shared by every caller
//! - [`store`] - Session store: projection plus login/logout/refresh/forced sign-out
//! - [`tokens`] - Token persistence (file and in-memory)
//! - [`keepalive`] - Periodic and on-focus background refresh
//! - [`navigate`] - Navigation sink and login-page route guard

pub mod error;
pub mod keepalive;
pub mod navigate;
mod pointer;
pub mod provider;
pub mod refresh;
pub mod state;
pub mod store;
pub mod tokens;

pub use error::{Result, SessionError};
pub use keepalive::Keepalive;
pub use navigate::{Navigator, RecordingNavigator, SharedNavigator, guard};
pub use provider::{Credentials, IdentityProvider, Restored};
pub use refresh::{RefreshCoordinator, RefreshFailure, RefreshOutcome};
pub use state::{AccessToken, AuthState, SessionStatus, SessionView, User};
pub use store::{DEFAULT_LOGIN_ERROR, SessionStore};
pub use tokens::{
    FileTokenStore, InMemoryTokenStore, SharedTokenStore, StoredTokens, TokenStore,
    create_memory_token_store, create_token_store,
};
