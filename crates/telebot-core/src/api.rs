//! Typed calls on top of a [`Transport`].
//!
//! [`Api`] is the handle handlers receive to talk back to the service. It is
//! cheap to clone and shares the underlying transport.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{trace, warn};

use crate::transport::{ApiRequest, BoxedTransport, Transport};
use crate::types::{ApiResponse, Message, User};

/// Typed access to the remote Bot API.
#[derive(Clone)]
pub struct Api {
    transport: BoxedTransport,
}

impl Api {
    /// Creates an API handle over the given transport.
    pub fn new(transport: BoxedTransport) -> Self {
        Self { transport }
    }

    /// Creates an API handle from a concrete transport.
    pub fn from_transport<T: Transport>(transport: T) -> Self {
        Self::new(Arc::new(transport))
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &BoxedTransport {
        &self.transport
    }

    /// Executes a request and decodes its `result` into `T`.
    ///
    /// A successful envelope whose result does not decode becomes a failure
    /// envelope carrying the decode error.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResponse<T> {
        let endpoint = request.endpoint.clone();
        trace!(endpoint = %endpoint, method = %request.method, "Calling API");
        let raw = self.transport.call(request).await;
        decode(&endpoint, raw)
    }

    /// Requests the identity of the bot owning the configured credential.
    pub async fn get_me(&self) -> ApiResponse<User> {
        self.call(ApiRequest::get("getMe")).await
    }

    /// Fetches the next batch of updates starting at `offset`.
    ///
    /// The server holds the call open for up to `timeout` when no update is
    /// pending. Updates are returned undecoded; the
    /// [`UpdateDispatcher`](crate::UpdateDispatcher) decodes each on its own.
    pub async fn get_updates(&self, timeout: Duration, offset: i64) -> ApiResponse<Vec<Value>> {
        let request = ApiRequest::get("getUpdates")
            .params(json!({
                "timeout": timeout.as_secs(),
                "offset": offset,
            }))
            .long_poll(timeout);
        self.call(request).await
    }

    /// Sends a text message to `chat_id`.
    pub async fn send_message(&self, chat_id: i64, text: impl Into<String>) -> ApiResponse<Message> {
        let request = ApiRequest::post("sendMessage").params(json!({
            "chat_id": chat_id,
            "text": text.into(),
        }));
        self.call(request).await
    }
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api").finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, raw: ApiResponse<Value>) -> ApiResponse<T> {
    let ApiResponse {
        ok,
        result,
        error,
        description,
        error_code,
    } = raw;

    let result = match result.map(serde_json::from_value::<T>) {
        Some(Ok(value)) => Some(value),
        Some(Err(e)) if ok => {
            warn!(endpoint = %endpoint, error = %e, "Failed to decode API result");
            return ApiResponse::failure(format!("failed to decode `{endpoint}` result: {e}"));
        }
        Some(Err(_)) | None => None,
    };

    ApiResponse {
        ok,
        result,
        error,
        description,
        error_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use crate::transport::Method;

    #[tokio::test]
    async fn test_get_me_decodes_identity() {
        let transport = MockTransport::new();
        transport.respond(
            "getMe",
            json!({"ok": true, "result": {"id": 123, "first_name": "Test-Bot", "username": "TestBot"}}),
        );
        let api = Api::new(transport.clone().boxed());

        let me = api.get_me().await.into_result().unwrap();
        assert_eq!(me.id, 123);
        assert_eq!(me.username.as_deref(), Some("TestBot"));

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::Get);
        assert!(calls[0].params.is_none());
    }

    #[tokio::test]
    async fn test_get_updates_sends_offset_and_timeout() {
        let transport = MockTransport::new();
        transport.respond("getUpdates", json!({"ok": true, "result": []}));
        let api = Api::new(transport.clone().boxed());

        let batch = api.get_updates(Duration::from_secs(30), 5).await;
        assert!(batch.is_ok());
        assert_eq!(batch.result, Some(Vec::new()));

        let call = &transport.calls()[0];
        assert_eq!(call.params, Some(json!({"timeout": 30, "offset": 5})));
        assert_eq!(call.long_poll, Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_send_message_posts_body() {
        let transport = MockTransport::new();
        let api = Api::new(transport.clone().boxed());

        api.send_message(42, "hi").await;

        let call = &transport.calls()[0];
        assert_eq!(call.method, Method::Post);
        assert_eq!(call.endpoint, "sendMessage");
        assert_eq!(call.params, Some(json!({"chat_id": 42, "text": "hi"})));
    }

    #[tokio::test]
    async fn test_undecodable_result_becomes_failure() {
        let transport = MockTransport::new();
        transport.respond("getMe", json!({"ok": true, "result": "not a user"}));
        let api = Api::new(transport.boxed());

        let me = api.get_me().await;
        assert!(!me.is_ok());
        assert!(me.failure_reason().contains("getMe"));
    }
}
