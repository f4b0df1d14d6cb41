//! Products API.

use reqwest::Method;
use serde_json::Value;

use super::Collection;
use crate::client::VitrineClient;
use crate::error::Result;
use crate::request::{FormData, RequestOptions};
use crate::types::Page;

/// Products API client. Products carry images, so bodies are multipart.
pub struct ProductsApi {
    collection: Collection,
}

impl ProductsApi {
    pub(crate) fn new(client: VitrineClient) -> Self {
        Self {
            collection: Collection::new(client, "products", Method::PATCH),
        }
    }

    /// Create a product.
    pub async fn create(&self, form: FormData) -> Result<Value> {
        self.collection.create(RequestOptions::post().form(form)).await
    }

    /// List one page of products.
    pub async fn list(&self, page: Page) -> Result<Value> {
        self.collection.list(page).await
    }

    /// Partially update a product. Only the supplied fields change.
    pub async fn update(&self, id: i64, form: FormData) -> Result<Value> {
        self.collection
            .update(id, RequestOptions::default().form(form))
            .await
    }

    /// Delete a product.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.collection.delete(id).await
    }
}
