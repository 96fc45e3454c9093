//! Handler parameter extraction.
//!
//! Every matching rule produces one [`RouteCall`]: the message payload, the
//! pattern's capture groups, the rule's endpoint/options and an [`Api`]
//! handle. Handler parameters are resolved from it through [`FromCall`], so a
//! handler only declares what it needs:
//!
//! ```rust,ignore
//! async fn parrot(api: Api, message: Message) { /* ... */ }
//!
//! async fn command(api: Api, message: Message, Args(args): Args) { /* ... */ }
//! ```

use std::collections::HashMap;

use crate::api::Api;
use crate::error::{ExtractError, ExtractResult};
use crate::rule::{Captures, RuleInfo};
use crate::types::Message;

/// Everything known about one handler invocation.
#[derive(Debug, Clone)]
pub struct RouteCall {
    api: Api,
    update_id: i64,
    message: Message,
    captures: Captures,
    rule: RuleInfo,
}

impl RouteCall {
    /// Creates a new invocation context.
    pub fn new(
        api: Api,
        update_id: i64,
        message: Message,
        captures: Captures,
        rule: RuleInfo,
    ) -> Self {
        Self {
            api,
            update_id,
            message,
            captures,
            rule,
        }
    }

    /// The API handle for replies.
    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Sequence id of the update being dispatched.
    pub fn update_id(&self) -> i64 {
        self.update_id
    }

    /// The message payload.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The capture groups of the matching pattern.
    pub fn captures(&self) -> &Captures {
        &self.captures
    }

    /// The matching rule's endpoint and options.
    pub fn rule(&self) -> &RuleInfo {
        &self.rule
    }
}

/// A type that can be extracted from a [`RouteCall`].
///
/// Types implementing this trait can be used directly as handler parameters.
/// A failed extraction aborts the invocation with
/// [`HandlerError::Extract`](crate::HandlerError::Extract).
pub trait FromCall: Sized {
    /// Attempts to extract this type from the invocation.
    fn from_call(call: &RouteCall) -> ExtractResult<Self>;
}

impl FromCall for Message {
    fn from_call(call: &RouteCall) -> ExtractResult<Self> {
        Ok(call.message.clone())
    }
}

impl FromCall for Captures {
    fn from_call(call: &RouteCall) -> ExtractResult<Self> {
        Ok(call.captures.clone())
    }
}

impl FromCall for Api {
    fn from_call(call: &RouteCall) -> ExtractResult<Self> {
        Ok(call.api.clone())
    }
}

impl FromCall for RuleInfo {
    fn from_call(call: &RouteCall) -> ExtractResult<Self> {
        Ok(call.rule.clone())
    }
}

/// Never fails; yields `None` when `T` cannot be extracted.
impl<T: FromCall> FromCall for Option<T> {
    fn from_call(call: &RouteCall) -> ExtractResult<Self> {
        Ok(T::from_call(call).ok())
    }
}

/// Positional capture groups as strings.
///
/// Groups that did not participate in the match become empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(pub Vec<String>);

impl FromCall for Args {
    fn from_call(call: &RouteCall) -> ExtractResult<Self> {
        Ok(Args(
            call.captures
                .positional
                .iter()
                .map(|g| g.clone().unwrap_or_default())
                .collect(),
        ))
    }
}

/// Named capture groups that participated in the match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Named(pub HashMap<String, String>);

impl Named {
    /// Returns the named group, or an error naming it.
    pub fn require(&self, name: &str) -> ExtractResult<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ExtractError::MissingGroup(name.to_string()))
    }
}

impl FromCall for Named {
    fn from_call(call: &RouteCall) -> ExtractResult<Self> {
        Ok(Named(
            call.captures
                .named
                .iter()
                .filter_map(|(k, v)| v.clone().map(|v| (k.clone(), v)))
                .collect(),
        ))
    }
}

/// Sequence id of the update being dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateId(pub i64);

impl FromCall for UpdateId {
    fn from_call(call: &RouteCall) -> ExtractResult<Self> {
        Ok(UpdateId(call.update_id))
    }
}
