//! # Telebot Core
//!
//! Engine pieces of the Telebot framework that do not depend on a runtime or
//! a network stack:
//!
//! - Data model for updates, messages and the `{ok, result | error}` envelope
//! - [`Transport`] abstraction and the typed [`Api`] built on it
//! - Rule registry with start-anchored pattern matching
//! - Axum-style [`Handler`] trait with parameter extraction
//! - [`UpdateDispatcher`] that fires every matching rule and tracks the offset
//!
//! The polling loop, configuration and logging live in `telebot-runtime`;
//! the HTTP transport lives in `telebot-transport`.

pub mod api;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod handler;
pub mod rule;
pub mod transport;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::Api;
pub use dispatcher::UpdateDispatcher;
pub use error::{
    BoxError, ExtractError, ExtractResult, HandlerError, HandlerResult, InvalidPatternError,
};
pub use extractor::{Args, FromCall, Named, RouteCall, UpdateId};
pub use handler::{
    BoxFuture, BoxedHandler, ErasedHandler, Handler, HandlerFn, IntoHandlerResult, into_handler,
};
pub use rule::{Captures, Rule, RuleInfo, RuleOptions, RuleRegistry};
pub use transport::{ApiRequest, BoxedTransport, Method, Transport};
pub use types::{ApiResponse, Chat, Message, MessageEntity, Update, User};
