use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, warn};

use super::traits::{HttpTransport, ProgressFn, TransportRequest, TransportResponse};
use crate::error::FetchError;
use crate::request::Method;

/// Timeouts for the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// `HttpTransport` backed by a shared reqwest client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(settings: TransportSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(TransportSettings::default())
    }

    /// Build the request with passthrough headers and, for POST/PUT with
    /// form fields, a urlencoded body.
    fn build_request(&self, request: &TransportRequest) -> RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
        };

        let mut builder = self.client.request(method, &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if !request.form.is_empty()
            && matches!(request.method, Method::Post | Method::Put)
        {
            builder = builder.form(&request.form);
        }
        builder
    }

    async fn send_checked(
        &self,
        request: &TransportRequest,
    ) -> Result<reqwest::Response, FetchError> {
        let response = self
            .build_request(request)
            .send()
            .await
            .map_err(|err| FetchError::from_reqwest(&err))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %request.url, status = status.as_u16(), "request failed");
            return Err(FetchError::Protocol {
                status: status.as_u16(),
            });
        }
        debug!(url = %request.url, status = status.as_u16(), "request ok");
        Ok(response)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, FetchError> {
        let response = self.send_checked(&request).await?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::from_reqwest(&err))?;
        Ok(TransportResponse { status, body })
    }

    async fn execute_streaming(
        &self,
        request: TransportRequest,
        progress: ProgressFn<'_>,
    ) -> Result<TransportResponse, FetchError> {
        let response = self.send_checked(&request).await?;
        let status = response.status().as_u16();
        let total = response.content_length().unwrap_or(0);

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| FetchError::from_reqwest(&err))?;
            body.extend_from_slice(&chunk);

            let received = body.len() as u64;
            let fraction = if total > 0 {
                (received as f32 / total as f32).min(1.0)
            } else {
                0.0
            };
            progress(fraction, received);
        }

        Ok(TransportResponse {
            status,
            body: body.into(),
        })
    }

    async fn head_content_length(&self, url: &str) -> Result<u64, FetchError> {
        let request = TransportRequest {
            method: Method::Head,
            url: url.to_string(),
            ..TransportRequest::default()
        };
        let response = self.send_checked(&request).await?;
        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| {
                FetchError::Data(format!("failed to parse Content-Length for {url}"))
            })
    }
}
