//! The innermost hop of the request pipeline: putting a request on the wire.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{ApiError, ApiRequest, ApiResponse};

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Sends a request and reports non-success statuses as errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Transport backed by reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn map_send_error(err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::TransportFailure {
                status: 504,
                message: format!("Request timed out: {}", err),
            }
        } else {
            ApiError::TransportFailure {
                status: 0,
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let ApiRequest {
            method,
            url,
            headers,
            body,
        } = request;
        debug!(%method, url = %url, "Sending request");

        let mut builder = self.client.request(method, url.clone()).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(Self::map_send_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(Self::map_send_error)?.to_vec();

        if status.is_success() {
            Ok(ApiResponse {
                status,
                headers,
                body,
            })
        } else {
            debug!(url = %url, status = status.as_u16(), "Request failed");
            Err(ApiError::from_status(
                status.as_u16(),
                &String::from_utf8_lossy(&body),
            ))
        }
    }
}
