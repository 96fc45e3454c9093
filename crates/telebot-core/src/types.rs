//! Data model for the remote Bot API.
//!
//! Only the fields the framework itself reads are typed. Everything else the
//! server sends is kept in a flattened `extra` map so handlers still see the
//! whole record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One discrete event delivered by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Sequence id of this update in the remote stream.
    #[serde(default)]
    pub update_id: i64,

    /// The incoming message, if this update carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,

    /// Fields not modelled above (edited messages, callbacks, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Update {
    /// Returns the message text when this update is a textual message.
    pub fn text(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| m.text.as_deref())
    }
}

/// An incoming chat message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: i64,

    #[serde(default)]
    pub chat: Chat,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,

    /// Unix timestamp.
    #[serde(default)]
    pub date: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<MessageEntity>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    /// Returns the chat id this message was sent in.
    pub fn chat_id(&self) -> i64 {
        self.chat.id
    }
}

/// A chat (private conversation, group, channel).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub id: i64,

    /// Chat kind: `private`, `group`, `supergroup` or `channel`.
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// A user or bot account.
///
/// Also used for the bot's own identity as returned by `getMe`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    #[serde(default)]
    pub is_bot: bool,

    #[serde(default)]
    pub first_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// A special entity inside message text (command, mention, url, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: i64,
    pub length: i64,
}

// =============================================================================
// Response Envelope
// =============================================================================

/// The success/error envelope every API call resolves to.
///
/// Transports never raise: a network or HTTP failure is reported as
/// `{ ok: false, error: <message> }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub ok: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,

    /// Failure reason attached by the transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Failure reason reported by the remote service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    /// A successful envelope carrying `result`.
    pub fn success(result: T) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            description: None,
            error_code: None,
        }
    }

    /// A failed envelope carrying `reason` in its `error` field.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(reason.into()),
            description: None,
            error_code: None,
        }
    }

    /// Returns whether the call succeeded.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// The best available explanation of a failure.
    pub fn failure_reason(&self) -> &str {
        self.error
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or("unknown error")
    }

    /// Converts the envelope into a `Result`, keeping the failure reason.
    ///
    /// A successful envelope without a `result` is treated as a failure.
    pub fn into_result(self) -> Result<T, String> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err("response carried no result".to_string()),
            (false, _) => Err(self
                .error
                .or(self.description)
                .unwrap_or_else(|| "unknown error".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_keeps_unknown_fields() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 7,
            "message": {
                "message_id": 73,
                "date": 1462057648,
                "text": "Test 1",
                "chat": {"id": 8282, "type": "private", "username": "TestUser"},
                "from": {"id": 8282, "first_name": "Test", "username": "TestUser"},
                "reply_markup": {"keyboard": []}
            },
            "edited_message": null
        }))
        .unwrap();

        assert_eq!(update.update_id, 7);
        assert_eq!(update.text(), Some("Test 1"));
        let message = update.message.as_ref().unwrap();
        assert_eq!(message.chat_id(), 8282);
        assert_eq!(message.chat.kind, "private");
        assert!(message.extra.contains_key("reply_markup"));
        assert!(update.extra.contains_key("edited_message"));
    }

    #[test]
    fn test_update_without_id_defaults_to_zero() {
        let update: Update = serde_json::from_value(json!({})).unwrap();
        assert_eq!(update.update_id, 0);
        assert!(update.text().is_none());
    }

    #[test]
    fn test_failure_reason_prefers_transport_error() {
        let resp: ApiResponse<Value> = serde_json::from_value(json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        }))
        .unwrap();
        assert_eq!(resp.failure_reason(), "Unauthorized");

        let resp = ApiResponse::<Value>::failure("boom");
        assert!(!resp.is_ok());
        assert_eq!(resp.failure_reason(), "boom");
        assert_eq!(resp.into_result(), Err("boom".to_string()));
    }

    #[test]
    fn test_missing_ok_is_failure() {
        let resp: ApiResponse<Value> = serde_json::from_value(json!({"result": []})).unwrap();
        assert!(!resp.is_ok());
        assert_eq!(resp.failure_reason(), "unknown error");
    }
}
