//! Categories API.

use reqwest::Method;
use serde_json::Value;

use super::Collection;
use crate::client::VitrineClient;
use crate::error::Result;
use crate::request::{FormData, RequestOptions};
use crate::types::{Category, Page};

/// Categories API client.
pub struct CategoriesApi {
    collection: Collection,
}

impl CategoriesApi {
    pub(crate) fn new(client: VitrineClient) -> Self {
        Self {
            collection: Collection::new(client, "categories", Method::PATCH),
        }
    }

    /// Create a category from form fields (`text`, `slug`, `icon`, ...).
    pub async fn create(&self, form: FormData) -> Result<Value> {
        self.collection.create(RequestOptions::post().form(form)).await
    }

    /// List one page of categories as raw JSON.
    pub async fn list(&self, page: Page) -> Result<Value> {
        self.collection.list(page).await
    }

    /// List one page of categories, decoded.
    ///
    /// Accepts either a bare array or an object carrying the array under
    /// `items`.
    pub async fn list_typed(&self, page: Page) -> Result<Vec<Category>> {
        let value = self.list(page).await?;
        let items = match value {
            Value::Object(mut map) => map.remove("items").unwrap_or(Value::Array(Vec::new())),
            other => other,
        };
        Ok(serde_json::from_value(items)?)
    }

    /// Partially update a category.
    pub async fn update(&self, id: i64, form: FormData) -> Result<Value> {
        self.collection
            .update(id, RequestOptions::default().form(form))
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.collection.delete(id).await
    }
}
