//! HTTP transport backed by `reqwest`.
//!
//! With the `http-transport` feature enabled, [`HttpTransport`] POSTs each
//! document and returns the body of a 2xx response. Without it, every call
//! returns [`WxPayError::Unimplemented`], so code depending on the type still
//! compiles in minimal builds.

use std::time::Duration;

use async_trait::async_trait;

use super::traits::{PostRequest, Transport};
#[cfg(not(feature = "http-transport"))]
use crate::WxPayError;
use crate::Result;

/// Upper bound on the response text carried in an `HttpStatus` error.
#[cfg(any(feature = "http-transport", test))]
const MAX_ERROR_BODY: usize = 512;

/// reqwest-backed [`Transport`].
#[derive(Clone)]
pub struct HttpTransport {
    timeout: Duration,
    #[cfg(feature = "http-transport")]
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`.
    #[cfg(feature = "http-transport")]
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                crate::WxPayError::Internal(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self { timeout, client })
    }

    /// Create a transport (stub when feature disabled).
    #[cfg(not(feature = "http-transport"))]
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self { timeout })
    }

    /// Wrap a preconfigured reqwest client (proxies, custom TLS roots).
    #[cfg(feature = "http-transport")]
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { timeout, client }
    }

    /// Configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[cfg(feature = "http-transport")]
    fn map_reqwest_error(&self, url: &str, e: reqwest::Error) -> crate::WxPayError {
        use crate::WxPayError;

        if e.is_timeout() {
            WxPayError::ConnectionTimeout {
                operation: format!("POST {}", url),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else if e.is_connect() {
            WxPayError::ConnectionFailed {
                target: url.to_string(),
                reason: e.to_string(),
            }
        } else {
            WxPayError::transport(e)
        }
    }
}

#[cfg(any(feature = "http-transport", test))]
fn truncate_body(body: &[u8]) -> String {
    let end = body.len().min(MAX_ERROR_BODY);
    String::from_utf8_lossy(&body[..end]).into_owned()
}

#[async_trait]
impl Transport for HttpTransport {
    #[cfg(feature = "http-transport")]
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, request), fields(url = %request.url)))]
    async fn post(&self, request: PostRequest) -> Result<Vec<u8>> {
        let PostRequest {
            url,
            content_type,
            body,
        } = request;

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(&url, e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest_error(&url, e))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(status = status.as_u16(), len = bytes.len(), "gateway responded");

        if !status.is_success() {
            return Err(crate::WxPayError::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(&bytes),
            });
        }
        Ok(bytes.to_vec())
    }

    #[cfg(not(feature = "http-transport"))]
    async fn post(&self, _request: PostRequest) -> Result<Vec<u8>> {
        Err(WxPayError::Unimplemented(
            "HTTP transport not compiled - enable the 'http-transport' feature",
        ))
    }
}
