//! Characteristics API.

use reqwest::Method;
use serde_json::Value;

use super::Collection;
use crate::client::VitrineClient;
use crate::error::Result;
use crate::request::RequestOptions;
use crate::types::{CharacteristicsRequest, Page};

/// Characteristics API client.
///
/// A characteristic group is a named list of `{name, label, value}` entries,
/// sent as JSON and replaced wholesale on update.
pub struct CharacteristicsApi {
    collection: Collection,
}

impl CharacteristicsApi {
    pub(crate) fn new(client: VitrineClient) -> Self {
        Self {
            collection: Collection::new(client, "characteristics", Method::PUT),
        }
    }

    pub async fn create(&self, request: &CharacteristicsRequest) -> Result<Value> {
        self.collection
            .create(RequestOptions::post().json(request)?)
            .await
    }

    pub async fn list(&self, page: Page) -> Result<Value> {
        self.collection.list(page).await
    }

    pub async fn update(&self, id: i64, request: &CharacteristicsRequest) -> Result<Value> {
        self.collection
            .update(id, RequestOptions::default().json(request)?)
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.collection.delete(id).await
    }
}
