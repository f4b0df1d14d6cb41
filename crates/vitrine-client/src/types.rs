//! Request and response types for the catalog API.

use serde::{Deserialize, Serialize};

use crate::request::RequestOptions;

// ─────────────────────────────────────────────────────────────────────────────
// Pagination
// ─────────────────────────────────────────────────────────────────────────────

/// Page selector for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    pub(crate) fn apply(self, options: RequestOptions) -> RequestOptions {
        options.query("page", self.page).query("limit", self.limit)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Categories
// ─────────────────────────────────────────────────────────────────────────────

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub text: String,
    pub slug: String,
    pub icon: String,
    #[serde(default)]
    pub filters: Vec<serde_json::Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tags
// ─────────────────────────────────────────────────────────────────────────────

/// Body for creating or replacing a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRequest {
    pub name: String,
    pub value: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Characteristics
// ─────────────────────────────────────────────────────────────────────────────

/// One labelled characteristic inside a characteristic group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristic {
    pub name: String,
    pub label: String,
    pub value: String,
}

/// Body for creating or replacing a characteristic group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharacteristicsRequest {
    pub name: String,
    #[serde(default)]
    pub characteristics: Vec<Characteristic>,
}
