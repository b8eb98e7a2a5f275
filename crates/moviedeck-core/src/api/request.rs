//! Outbound call descriptors.
//!
//! An `ApiRequest` is plain data and cheap to clone, so a pipeline stage can
//! derive a modified copy while the caller's original stays replayable.

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::ApiError;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Derive a copy of this request carrying `token` as a bearer credential.
    pub fn with_bearer(&self, token: &str) -> Result<Self, ApiError> {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid bearer token: {}", e)))?;
        let mut derived = self.clone();
        derived.headers.insert(header::AUTHORIZATION, value);
        Ok(derived)
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    /// True if any path segment of the target equals `segment`.
    pub fn has_path_segment(&self, segment: &str) -> bool {
        self.url
            .path_segments()
            .map(|mut segments| segments.any(|s| s == segment))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response: {}", e)))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
