//! Resource API implementations.
//!
//! Every resource is a collection at `/<name>/` with items at `/<name>/<id>`.
//! Lists always bypass the response cache.

mod brands;
mod categories;
mod characteristics;
mod products;
mod subcategories;
mod tags;

pub use brands::BrandsApi;
pub use categories::CategoriesApi;
pub use characteristics::CharacteristicsApi;
pub use products::ProductsApi;
pub use subcategories::SubcategoriesApi;
pub use tags::TagsApi;

use reqwest::Method;
use serde_json::Value;

use crate::client::VitrineClient;
use crate::error::Result;
use crate::request::RequestOptions;
use crate::types::Page;

/// Shared CRUD plumbing for one collection.
#[derive(Debug, Clone)]
struct Collection {
    client: VitrineClient,
    name: &'static str,
    update_method: Method,
}

impl Collection {
    fn new(client: VitrineClient, name: &'static str, update_method: Method) -> Self {
        Self {
            client,
            name,
            update_method,
        }
    }

    fn collection_path(&self) -> String {
        format!("/{}/", self.name)
    }

    fn item_path(&self, id: i64) -> String {
        format!("/{}/{}", self.name, id)
    }

    async fn create(&self, options: RequestOptions) -> Result<Value> {
        self.client
            .call(self.collection_path(), options, false)
            .await
    }

    async fn list(&self, page: Page) -> Result<Value> {
        self.client
            .call(self.collection_path(), page.apply(RequestOptions::get()), true)
            .await
    }

    async fn update(&self, id: i64, options: RequestOptions) -> Result<Value> {
        let options = RequestOptions {
            method: self.update_method.clone(),
            ..options
        };
        self.client.call(self.item_path(id), options, false).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.client
            .call_empty(self.item_path(id), RequestOptions::delete())
            .await
    }
}
