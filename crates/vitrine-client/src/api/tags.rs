//! Tags API.

use reqwest::Method;
use serde_json::Value;

use super::Collection;
use crate::client::VitrineClient;
use crate::error::Result;
use crate::request::RequestOptions;
use crate::types::{Page, TagRequest};

/// Tags API client. Tags are plain `{name, value}` JSON objects.
pub struct TagsApi {
    collection: Collection,
}

impl TagsApi {
    pub(crate) fn new(client: VitrineClient) -> Self {
        Self {
            collection: Collection::new(client, "tags", Method::PUT),
        }
    }

    /// Create a tag.
    pub async fn create(&self, name: impl Into<String>, value: impl Into<String>) -> Result<Value> {
        let body = TagRequest {
            name: name.into(),
            value: value.into(),
        };
        self.collection.create(RequestOptions::post().json(&body)?).await
    }

    /// List one page of tags.
    pub async fn list(&self, page: Page) -> Result<Value> {
        self.collection.list(page).await
    }

    /// Replace a tag.
    pub async fn update(
        &self,
        id: i64,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Value> {
        let body = TagRequest {
            name: name.into(),
            value: value.into(),
        };
        self.collection
            .update(id, RequestOptions::default().json(&body)?)
            .await
    }

    /// Delete a tag.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.collection.delete(id).await
    }
}
