use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;
use crate::request::Method;

/// One HTTP call as the dispatcher sees it: method, URL, passthrough
/// headers, and optional urlencoded form fields.
#[derive(Debug, Clone, Default)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub form: HashMap<String, String>,
}

impl TransportRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// A completed round-trip with a success status.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

impl TransportResponse {
    /// Decode the body as UTF-8, classifying failure as a data error.
    pub fn text(&self) -> Result<String, FetchError> {
        std::str::from_utf8(&self.body)
            .map(str::to_owned)
            .map_err(|err| FetchError::Data(format!("response body is not UTF-8: {err}")))
    }
}

/// Per-chunk download progress: completed fraction (0.0 when the total
/// length is unknown) and bytes received so far.
pub type ProgressFn<'a> = &'a (dyn Fn(f32, u64) + Send + Sync);

/// Network transport primitive behind the dispatcher.
///
/// Implementations classify failures into `FetchError`: connection-level
/// problems as `Transport`, non-2xx statuses as `Protocol`, undecodable
/// bodies as `Data`. They never retry; retry policy lives in the queue.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute a request and buffer the full body.
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, FetchError>;

    /// Execute a request, reporting progress per received body chunk.
    async fn execute_streaming(
        &self,
        request: TransportRequest,
        progress: ProgressFn<'_>,
    ) -> Result<TransportResponse, FetchError>;

    /// HEAD probe for the Content-Length a URL would serve.
    async fn head_content_length(&self, url: &str) -> Result<u64, FetchError>;
}
