use async_trait::async_trait;

use crate::Result;

/// A single outbound gateway call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostRequest {
    /// Full endpoint URL.
    pub url: String,
    /// Value of the `Content-Type` header.
    pub content_type: &'static str,
    /// Encoded request document.
    pub body: Vec<u8>,
}

/// Capability to deliver a request body and return the raw response body.
///
/// Implementations own connection handling and timeouts. They must not retry
/// on their own; failures are returned as transport-category errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `request` and return the response body.
    async fn post(&self, request: PostRequest) -> Result<Vec<u8>>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn post(&self, request: PostRequest) -> Result<Vec<u8>> {
        (**self).post(request).await
    }
}
