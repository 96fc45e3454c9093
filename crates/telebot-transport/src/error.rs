//! Transport error types.
//!
//! These never leave the transport as `Err`: [`HttpTransport`](crate::HttpTransport)
//! renders them into the failure envelope. They exist so the failure modes
//! stay distinguishable in logs and tests.

use thiserror::Error;

/// Errors that can occur while performing one API call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be assembled (bad base URL, client setup).
    #[error("failed to build request: {0}")]
    Build(String),

    /// The request could not be sent or the response body could not be read.
    #[error("{0}")]
    Request(String),

    /// The server answered with a status other than 200.
    #[error("Got unexpected response. ({status}) - {body}")]
    Status { status: u16, body: String },

    /// The response body was not a valid envelope.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Result type alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
