//! The transport seam.
//!
//! A [`Transport`] performs one outbound call against the remote Bot API and
//! resolves to the JSON envelope the service returned. Implementations must
//! never surface network errors as `Err`: every failure is folded into
//! [`ApiResponse::failure`].
//!
//! ```text
//! ┌──────────┐  ApiRequest   ┌─────────────┐   HTTP   ┌────────────┐
//! │   Api    │──────────────▶│  Transport  │─────────▶│  Bot API   │
//! │ (typed)  │◀──────────────│ (untyped)   │◀─────────│  (remote)  │
//! └──────────┘ ApiResponse   └─────────────┘          └────────────┘
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::ApiResponse;

/// HTTP method of an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// A single outbound API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Endpoint name, e.g. `getUpdates`.
    pub endpoint: String,
    /// Query parameters (GET) or body (POST). Expected to be a JSON object.
    pub params: Option<Value>,
    /// How long the server may hold the call open, for long-polling endpoints.
    pub long_poll: Option<Duration>,
}

impl ApiRequest {
    /// Creates a request with the given method and endpoint.
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            params: None,
            long_poll: None,
        }
    }

    /// Creates a `GET` request.
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    /// Creates a `POST` request.
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Post, endpoint)
    }

    /// Sets the request parameters.
    pub fn params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Marks the call as a long poll held open for up to `wait`.
    pub fn long_poll(mut self, wait: Duration) -> Self {
        self.long_poll = Some(wait);
        self
    }
}

/// Performs raw calls against the remote API.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Executes `request` and returns the decoded envelope.
    ///
    /// Any lower-level failure must be reported as `{ ok: false, error }`.
    async fn call(&self, request: ApiRequest) -> ApiResponse<Value>;
}

/// A shared transport trait object.
pub type BoxedTransport = Arc<dyn Transport>;
