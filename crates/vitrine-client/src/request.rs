//! Outbound request description.
//!
//! Everything here is owned data so a request can be re-issued after a token
//! refresh; multipart forms in particular are rebuilt per attempt.

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Serialize;

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Target
// ─────────────────────────────────────────────────────────────────────────────

/// Where a request goes: a fixed path or a function producing one at call
/// time.
#[derive(Clone)]
pub enum RequestTarget {
    Path(String),
    Deferred(Arc<dyn Fn() -> String + Send + Sync>),
}

impl RequestTarget {
    /// Target computed when the request is issued.
    pub fn deferred(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        RequestTarget::Deferred(Arc::new(f))
    }

    /// Resolve to a path. Empty paths are rejected.
    pub fn resolve(&self) -> Result<String> {
        let path = match self {
            RequestTarget::Path(path) => path.clone(),
            RequestTarget::Deferred(f) => f(),
        };
        if path.trim().is_empty() {
            return Err(Error::InvalidRequest("request path is empty".to_string()));
        }
        Ok(path)
    }
}

impl fmt::Debug for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestTarget::Path(path) => f.debug_tuple("Path").field(path).finish(),
            RequestTarget::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<&str> for RequestTarget {
    fn from(path: &str) -> Self {
        RequestTarget::Path(path.to_string())
    }
}

impl From<String> for RequestTarget {
    fn from(path: String) -> Self {
        RequestTarget::Path(path)
    }
}

impl From<&String> for RequestTarget {
    fn from(path: &String) -> Self {
        RequestTarget::Path(path.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Body
// ─────────────────────────────────────────────────────────────────────────────

/// A single multipart field.
#[derive(Debug, Clone)]
pub enum FormPart {
    Text(String),
    File {
        file_name: String,
        mime: Option<String>,
        content: Vec<u8>,
    },
}

/// Multipart form data.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    parts: Vec<(String, FormPart)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts
            .push((name.into(), FormPart::Text(value.into())));
        self
    }

    /// Append a file field.
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<&str>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        self.parts.push((
            name.into(),
            FormPart::File {
                file_name: file_name.into(),
                mime: mime.map(str::to_owned),
                content: content.into(),
            },
        ));
        self
    }

    pub fn parts(&self) -> &[(String, FormPart)] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub(crate) fn to_multipart(&self) -> Result<Form> {
        let mut form = Form::new();
        for (name, part) in &self.parts {
            form = match part {
                FormPart::Text(value) => form.text(name.clone(), value.clone()),
                FormPart::File {
                    file_name,
                    mime,
                    content,
                } => {
                    let mut file = Part::bytes(content.clone()).file_name(file_name.clone());
                    if let Some(mime) = mime {
                        file = file.mime_str(mime)?;
                    }
                    form.part(name.clone(), file)
                }
            };
        }
        Ok(form)
    }
}

/// Request body.
#[derive(Debug, Clone)]
pub enum Body {
    Json(serde_json::Value),
    Form(FormData),
}

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Method, body and query of a request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Body>,
    pub query: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            query: Vec::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Send `body` as JSON.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(Body::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Send `form` as multipart form data.
    pub fn form(mut self, form: FormData) -> Self {
        self.body = Some(Body::Form(form));
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}
