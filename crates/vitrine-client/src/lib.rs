//! Authenticated HTTP client for the Vitrine catalog API.
//!
//! [`VitrineClient::request`] is the single entry point every resource call
//! goes through. It attaches the standard platform/locale headers and the
//! bearer token held by the [`SessionStore`](vitrine_session::SessionStore),
//! and recovers from an expired token by joining the session's single-flight
//! refresh and retrying once. When the session cannot be recovered it is
//! signed out and the caller receives the original 401 as
//! [`Error::Unauthorized`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vitrine_client::{FormData, Page, VitrineClient};
//! use vitrine_config::VitrineConfig;
//! use vitrine_session::{Credentials, RecordingNavigator, SessionStore, create_memory_token_store};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = VitrineConfig::new().with_api_host("https://api.example.com");
//! let session = Arc::new(SessionStore::from_config(
//!     &config,
//!     create_memory_token_store(),
//!     Arc::new(RecordingNavigator::new()),
//! )?);
//! session.login(&Credentials::new("admin", "secret"), "/").await?;
//!
//! let client = VitrineClient::from_config(&config, session)?;
//! let tags = client.tags().list(Page::default()).await?;
//! client.brands().create(FormData::new().text("name", "Acme")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Brands**: create, list, replace (`PUT`), delete
//! - **Categories**: create, list, update (`PATCH`), delete
//! - **Subcategories**: create, list, update (`PATCH`), delete
//! - **Products**: create, list, update (`PATCH`), delete
//! - **Tags**: create, list, replace (`PUT`), delete
//! - **Characteristics**: create, list, replace (`PUT`), delete

pub mod api;
pub mod cache;
pub mod client;
pub mod error;
pub mod hook;
pub mod request;
pub mod response;
pub mod types;

pub use cache::ResponseCache;
pub use client::{ClientBuilder, VitrineClient};
pub use error::{Error, Result};
pub use hook::{ResponseContext, ResponseHook, TracingHook};
pub use request::{Body, FormData, FormPart, RequestOptions, RequestTarget};
pub use response::ApiResponse;
pub use types::*;

pub use reqwest::Method;
pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
