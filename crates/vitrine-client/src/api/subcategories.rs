//! Subcategories API.

use reqwest::Method;
use serde_json::Value;

use super::Collection;
use crate::client::VitrineClient;
use crate::error::Result;
use crate::request::{FormData, RequestOptions};
use crate::types::Page;

/// Subcategories API client.
pub struct SubcategoriesApi {
    collection: Collection,
}

impl SubcategoriesApi {
    pub(crate) fn new(client: VitrineClient) -> Self {
        Self {
            collection: Collection::new(client, "subcategories", Method::PATCH),
        }
    }

    pub async fn create(&self, form: FormData) -> Result<Value> {
        self.collection.create(RequestOptions::post().form(form)).await
    }

    pub async fn list(&self, page: Page) -> Result<Value> {
        self.collection.list(page).await
    }

    pub async fn update(&self, id: i64, form: FormData) -> Result<Value> {
        self.collection
            .update(id, RequestOptions::default().form(form))
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.collection.delete(id).await
    }
}
