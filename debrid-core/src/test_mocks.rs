//! Mock HTTP client for exercising adapters without a network.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::errors::TransportError;
use crate::transport::{HttpClient, HttpRequest, HttpResponse};

/// One scripted outcome.
#[derive(Debug, Clone)]
enum MockReply {
    Response(HttpResponse),
    NetworkError(String),
}

/// Replays queued responses in order and records every request.
///
/// Adapters issue their calls strictly sequentially, so a FIFO queue is
/// enough to script a whole multi-step protocol. Running out of scripted
/// responses yields a network error.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    /// Creates a new mock client behind an `Arc` for sharing with adapters.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a JSON response.
    pub fn push_json(&self, status: u16, body: Value) {
        self.replies
            .lock()
            .push_back(MockReply::Response(HttpResponse::new(status, body.to_string())));
    }

    /// Queues a response with a raw body.
    pub fn push_raw(&self, status: u16, body: &str) {
        self.replies
            .lock()
            .push_back(MockReply::Response(HttpResponse::new(status, body)));
    }

    /// Queues a connection failure.
    pub fn push_network_error(&self, reason: &str) {
        self.replies
            .lock()
            .push_back(MockReply::NetworkError(reason.to_string()));
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }

    /// Paths of all requests, for asserting protocol order.
    pub fn paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|request| request.path().to_string())
            .collect()
    }

    /// Number of scripted replies not consumed yet.
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let path = request.path().to_string();
        self.requests.lock().push(request);

        match self.replies.lock().pop_front() {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::NetworkError(reason)) => Err(TransportError::Network {
                reason,
                timed_out: false,
            }),
            None => Err(TransportError::Network {
                reason: format!("No scripted response for {path}"),
                timed_out: false,
            }),
        }
    }
}
