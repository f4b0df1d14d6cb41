//! Buffered API response.

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// A fully read response. Cheap to clone, so it can be cached.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.is_empty() {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
impl ApiResponse {
    pub(crate) fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_json_body() {
        let response = ApiResponse::new(StatusCode::OK, r#"{"id": 7, "text": "Shoes"}"#);
        let value: Value = response.json().unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(response.text(), r#"{"id": 7, "text": "Shoes"}"#);
    }

    #[test]
    fn test_empty_body() {
        let response = ApiResponse::new(StatusCode::NO_CONTENT, Bytes::new());
        assert!(response.is_empty());
        let value: Value = response.json().unwrap();
        assert!(value.is_null());
        let unit: Option<Value> = response.json().unwrap();
        assert!(unit.is_none());
    }
}
