//! Mock transport for testing.
//!
//! Allows queueing responses and capturing sent requests for verification.

use super::{Transport, TransportError};
use async_trait::async_trait;
use roomsync_types::{ApiRequest, ApiResponse};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock transport for testing.
///
/// Responses are returned in the order they were queued. Requests are
/// recorded in the order they were issued.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    sent_requests: Vec<ApiRequest>,
    response_queue: VecDeque<ApiResponse>,
    fail_next_request: Option<String>,
    stall_next_request: bool,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to be returned by the next `get()` call.
    pub fn queue_response(&self, response: ApiResponse) {
        let mut inner = self.inner.lock().unwrap();
        inner.response_queue.push_back(response);
    }

    /// Queue a successful response carrying the given payload.
    pub fn queue_ok(&self, data: serde_json::Value) {
        self.queue_response(ApiResponse::ok(data));
    }

    /// Get all requests that were sent.
    pub fn sent_requests(&self) -> Vec<ApiRequest> {
        let inner = self.inner.lock().unwrap();
        inner.sent_requests.clone()
    }

    /// Get the last request that was sent.
    pub fn last_sent(&self) -> Option<ApiRequest> {
        let inner = self.inner.lock().unwrap();
        inner.sent_requests.last().cloned()
    }

    /// Number of responses still queued.
    pub fn pending_responses(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.response_queue.len()
    }

    /// Cause the next get() to fail with the given error.
    pub fn fail_next_request(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_request = Some(error.to_string());
    }

    /// Cause the next get() to never complete.
    pub fn stall_next_request(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.stall_next_request = true;
    }

    /// Clear all state (requests, queue, forced failures).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let outcome = {
            let mut inner = self.inner.lock().unwrap();
            inner.sent_requests.push(request.clone());

            // Check for forced failure
            if let Some(error) = inner.fail_next_request.take() {
                return Err(TransportError::RequestFailed(error));
            }

            if std::mem::take(&mut inner.stall_next_request) {
                None
            } else {
                Some(
                    inner
                        .response_queue
                        .pop_front()
                        .ok_or(TransportError::ConnectionClosed),
                )
            }
        };

        match outcome {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}
