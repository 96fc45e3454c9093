//! Handler system.
//!
//! Handlers are plain async functions. Their parameters are resolved through
//! [`FromCall`] and their return value is either `()` or a `Result<(), E>`:
//!
//! ```rust,ignore
//! use telebot_core::{Api, Args, Message};
//!
//! async fn ping(api: Api, message: Message) {
//!     api.send_message(message.chat_id(), "pong").await;
//! }
//!
//! async fn echo(api: Api, message: Message, Args(args): Args) -> anyhow::Result<()> {
//!     api.send_message(message.chat_id(), args.join(" ")).await.into_result()?;
//!     Ok(())
//! }
//! ```
//!
//! Errors returned by a handler are not swallowed; they surface from the
//! dispatcher as [`HandlerError`].

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use futures::FutureExt;

use crate::error::{BoxError, HandlerError, HandlerResult};
use crate::extractor::{FromCall, RouteCall};

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ============================================================================
// Return values
// ============================================================================

/// Converts a handler's return value into a [`HandlerResult`].
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<E> IntoHandlerResult for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(|e| HandlerError::Handler(e.into()))
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// The core trait for update handlers.
///
/// Implemented automatically for async functions taking 0-8 parameters that
/// implement [`FromCall`] and returning an [`IntoHandlerResult`] value.
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// The type of future calling this handler returns.
    type Future: Future<Output = HandlerResult> + Send + 'static;

    /// Call the handler for one matched update.
    fn call(self, call: Arc<RouteCall>) -> Self::Future;
}

/// A wrapper that converts a function into a boxed handler.
pub struct HandlerFn<F, T> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

impl<F, T> HandlerFn<F, T> {
    /// Creates a new handler function wrapper.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F: Clone, T> Clone for HandlerFn<F, T> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _marker: PhantomData,
        }
    }
}

/// A type-erased handler that can be stored in collections.
pub type BoxedHandler = Arc<dyn ErasedHandler>;

/// Type-erased handler trait for dynamic dispatch.
pub trait ErasedHandler: Send + Sync {
    /// Execute the handler for the given invocation.
    fn call(&self, call: Arc<RouteCall>) -> BoxFuture<'static, HandlerResult>;
}

impl<F, T> ErasedHandler for HandlerFn<F, T>
where
    F: Handler<T>,
    T: 'static,
{
    fn call(&self, call: Arc<RouteCall>) -> BoxFuture<'static, HandlerResult> {
        self.f.clone().call(call).boxed()
    }
}

/// Convert a handler function into a boxed handler.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T>,
    T: 'static,
{
    Arc::new(HandlerFn::new(f))
}

// ============================================================================
// Handler implementations for functions
// ============================================================================

impl<F, Fut, R> Handler<()> for F
where
    F: FnOnce() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult,
{
    type Future = BoxFuture<'static, HandlerResult>;

    fn call(self, _call: Arc<RouteCall>) -> Self::Future {
        Box::pin(async move { (self)().await.into_handler_result() })
    }
}

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case)]
        impl<F, Fut, R, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoHandlerResult,
            $( $ty: FromCall + Send + 'static, )*
        {
            type Future = BoxFuture<'static, HandlerResult>;

            fn call(self, call: Arc<RouteCall>) -> Self::Future {
                Box::pin(async move {
                    $(
                        let $ty = $ty::from_call(&call)?;
                    )*

                    (self)($($ty,)*).await.into_handler_result()
                })
            }
        }
    };
}

impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Api;
    use crate::extractor::{Args, Named, UpdateId};
    use crate::rule::{Captures, RuleInfo};
    use crate::testing::MockTransport;
    use crate::types::Message;
    use std::collections::HashMap;
    use tokio_test::{assert_err, assert_ok};

    fn route_call(captures: Captures) -> Arc<RouteCall> {
        let message = Message {
            text: Some("/cmd arg".into()),
            ..Default::default()
        };
        Arc::new(RouteCall::new(
            Api::new(MockTransport::new().boxed()),
            9,
            message,
            captures,
            RuleInfo::default(),
        ))
    }

    #[tokio::test]
    async fn test_unit_handler() {
        let handler = into_handler(|| async {});
        assert_ok!(handler.call(route_call(Captures::default())).await);
    }

    #[tokio::test]
    async fn test_extractors_resolve() {
        let captures = Captures {
            positional: vec![Some("arg".into()), None],
            named: HashMap::from([("who".to_string(), Some("arg".to_string()))]),
        };
        let handler = into_handler(
            |message: Message, Args(args): Args, named: Named, UpdateId(id): UpdateId| async move {
                assert_eq!(message.text.as_deref(), Some("/cmd arg"));
                assert_eq!(args, vec!["arg".to_string(), String::new()]);
                assert_eq!(named.require("who").unwrap(), "arg");
                assert!(named.require("nobody").is_err());
                assert_eq!(id, 9);
            },
        );
        assert_ok!(handler.call(route_call(captures)).await);
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let handler = into_handler(|_m: Message| async { Err::<(), _>("nope") });
        let err = assert_err!(handler.call(route_call(Captures::default())).await);
        assert!(matches!(err, HandlerError::Handler(_)));
        assert_eq!(err.to_string(), "handler failed: nope");
    }
}
