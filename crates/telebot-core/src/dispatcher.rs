//! Update dispatcher.
//!
//! The [`UpdateDispatcher`] owns the rule registry and the update offset.
//! For each incoming update it:
//!
//! 1. Advances the offset to `max(offset, update_id) + 1`, unconditionally
//! 2. Checks every rule against the message text in registration order
//! 3. Invokes the handler of **every** matching rule, one after another
//!
//! This is not a first-match router: rules behave like independent filters
//! evaluated against every update.
//!
//! ```rust,ignore
//! let mut dispatcher = UpdateDispatcher::new();
//! dispatcher.rules_mut().register("(?!/).+", parrot, None, RuleOptions::new())?;
//! dispatcher.rules_mut().register("/cmd (.*)", command, None, RuleOptions::new())?;
//!
//! dispatcher.process_update(&api, update).await?;
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::{Instrument, Level, debug, span, trace, warn};

use crate::api::Api;
use crate::error::HandlerResult;
use crate::extractor::RouteCall;
use crate::rule::RuleRegistry;
use crate::types::{ApiResponse, Update};

/// Routes updates to registered rules and tracks the stream offset.
///
/// Updates are processed strictly one at a time; all handlers for one update
/// complete before the next update is looked at.
#[derive(Debug, Default, Clone)]
pub struct UpdateDispatcher {
    rules: RuleRegistry,
    offset: i64,
}

impl UpdateDispatcher {
    /// Creates a dispatcher with no rules and offset 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher over an existing registry.
    pub fn with_rules(rules: RuleRegistry) -> Self {
        Self { rules, offset: 0 }
    }

    /// The rule registry.
    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// Mutable access to the rule registry, for registration.
    pub fn rules_mut(&mut self) -> &mut RuleRegistry {
        &mut self.rules
    }

    /// The next update id to request.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Overrides the offset.
    pub fn set_offset(&mut self, offset: i64) {
        debug!(old = self.offset, new = offset, "Offset overridden");
        self.offset = offset;
    }

    /// Processes one update.
    ///
    /// The offset is advanced before any handler runs, so it moves even when
    /// no rule matches or a handler fails. The first handler error is
    /// returned immediately; handlers of later rules are not run.
    pub async fn process_update(&mut self, api: &Api, update: Update) -> HandlerResult {
        self.advance(update.update_id);

        let span = span!(Level::DEBUG, "update", update_id = update.update_id);

        let Some(message) = update.message else {
            trace!(parent: &span, "Update carries no message, skipping");
            return Ok(());
        };
        let Some(text) = message.text.as_deref() else {
            trace!(parent: &span, "Message has no text, skipping");
            return Ok(());
        };

        for (index, rule) in self.rules.iter().enumerate() {
            let Some(captures) = rule.captures(text) else {
                continue;
            };

            debug!(
                parent: &span,
                rule = %rule.pattern(),
                endpoint = rule.endpoint().unwrap_or("unnamed"),
                index,
                "Rule matched, invoking handler"
            );

            let call = Arc::new(RouteCall::new(
                api.clone(),
                update.update_id,
                message.clone(),
                captures,
                rule.info().clone(),
            ));
            rule.handler().call(call).instrument(span.clone()).await?;
        }

        Ok(())
    }

    /// Processes one update as received from the server.
    ///
    /// An update that does not decode still advances the offset from its raw
    /// `update_id` and is then skipped, so it is never fetched again.
    pub async fn process_raw_update(&mut self, api: &Api, raw: Value) -> HandlerResult {
        let update_id = raw_update_id(&raw);
        match serde_json::from_value::<Update>(raw) {
            Ok(update) => self.process_update(api, update).await,
            Err(e) => {
                self.advance(update_id);
                warn!(update_id, error = %e, "Skipping undecodable update");
                Ok(())
            }
        }
    }

    /// Processes a fetched batch in list order.
    ///
    /// A batch whose `ok` flag is false is ignored. Each update is decoded on
    /// its own; see [`process_raw_update`](Self::process_raw_update).
    pub async fn process_updates(
        &mut self,
        api: &Api,
        batch: ApiResponse<Vec<Value>>,
    ) -> HandlerResult {
        if !batch.ok {
            debug!(reason = batch.failure_reason(), "Ignoring failed update batch");
            return Ok(());
        }

        for raw in batch.result.unwrap_or_default() {
            self.process_raw_update(api, raw).await?;
        }

        Ok(())
    }

    fn advance(&mut self, update_id: i64) {
        self.offset = self.offset.max(update_id).saturating_add(1);
    }
}

fn raw_update_id(raw: &Value) -> i64 {
    raw.get("update_id").and_then(Value::as_i64).unwrap_or(0)
}
