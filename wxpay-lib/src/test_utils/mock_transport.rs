//! In-memory transport that records requests and replays canned responses.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::transport::{PostRequest, Transport};
use crate::{Result, WxPayError};

/// Recording [`Transport`] for tests.
///
/// Responses are returned in the order they were pushed. A call with no
/// response queued fails with a transport error.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Vec<u8>>>>,
    requests: Mutex<Vec<PostRequest>>,
}

impl MockTransport {
    /// Create a transport with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response body.
    pub fn push_response(&self, body: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(body.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, err: WxPayError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<PostRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, request: PostRequest) -> Result<Vec<u8>> {
        self.requests
            .lock()
            .map_err(|_| WxPayError::lock_poisoned("mock request log"))?
            .push(request);
        self.responses
            .lock()
            .map_err(|_| WxPayError::lock_poisoned("mock response queue"))?
            .pop_front()
            .unwrap_or_else(|| Err(WxPayError::Transport("no response queued".to_string())))
    }
}
