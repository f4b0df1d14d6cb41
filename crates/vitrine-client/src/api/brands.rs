//! Brands API.

use reqwest::Method;
use serde_json::Value;

use super::Collection;
use crate::client::VitrineClient;
use crate::error::Result;
use crate::request::{FormData, RequestOptions};
use crate::types::Page;

/// Brands API client. Brands are sent as form data and replaced with `PUT`.
pub struct BrandsApi {
    collection: Collection,
}

impl BrandsApi {
    pub(crate) fn new(client: VitrineClient) -> Self {
        Self {
            collection: Collection::new(client, "brands", Method::PUT),
        }
    }

    /// Create a brand.
    pub async fn create(&self, form: FormData) -> Result<Value> {
        self.collection.create(RequestOptions::post().form(form)).await
    }

    /// List one page of brands.
    pub async fn list(&self, page: Page) -> Result<Value> {
        self.collection.list(page).await
    }

    /// Replace a brand.
    pub async fn update(&self, id: i64, form: FormData) -> Result<Value> {
        self.collection
            .update(id, RequestOptions::default().form(form))
            .await
    }

    /// Delete a brand.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.collection.delete(id).await
    }
}
