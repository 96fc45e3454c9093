//! Scripted in-memory transport for tests.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for downstream crates.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::transport::{ApiRequest, BoxedTransport, Transport};
use crate::types::ApiResponse;

#[derive(Default)]
struct MockState {
    queued: HashMap<String, VecDeque<ApiResponse<Value>>>,
    exhausted: HashMap<String, ApiResponse<Value>>,
    calls: Vec<ApiRequest>,
}

/// A [`Transport`] that replays scripted responses per endpoint and records
/// every request it receives.
///
/// Queued responses are consumed in order. Once an endpoint's queue is empty
/// the response set with [`when_exhausted`](Self::when_exhausted) is returned,
/// or a failure envelope if none was set.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a raw JSON envelope for `endpoint`.
    pub fn respond(&self, endpoint: &str, envelope: Value) -> &Self {
        let response = parse_envelope(envelope);
        self.state
            .lock()
            .queued
            .entry(endpoint.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Sets the envelope returned for `endpoint` once its queue is drained.
    pub fn when_exhausted(&self, endpoint: &str, envelope: Value) -> &Self {
        self.state
            .lock()
            .exhausted
            .insert(endpoint.to_string(), parse_envelope(envelope));
        self
    }

    /// Returns every request received so far.
    pub fn calls(&self) -> Vec<ApiRequest> {
        self.state.lock().calls.clone()
    }

    /// Returns the requests received for `endpoint`.
    pub fn calls_to(&self, endpoint: &str) -> Vec<ApiRequest> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .cloned()
            .collect()
    }

    /// Wraps this mock as a shared transport.
    pub fn boxed(self) -> BoxedTransport {
        Arc::new(self)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, request: ApiRequest) -> ApiResponse<Value> {
        let mut state = self.state.lock();
        let endpoint = request.endpoint.clone();
        state.calls.push(request);

        if let Some(response) = state.queued.get_mut(&endpoint).and_then(VecDeque::pop_front) {
            return response;
        }
        state
            .exhausted
            .get(&endpoint)
            .cloned()
            .unwrap_or_else(|| ApiResponse::failure(format!("no scripted response for `{endpoint}`")))
    }
}

fn parse_envelope(envelope: Value) -> ApiResponse<Value> {
    serde_json::from_value(envelope)
        .unwrap_or_else(|e| ApiResponse::failure(format!("malformed scripted envelope: {e}")))
}
