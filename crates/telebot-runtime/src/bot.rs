//! The bot instance and its polling loop.
//!
//! A [`TeleBot`] owns everything that changes while the bot runs: the update
//! offset (through its dispatcher), the cached identity and the loop state.
//! Nothing is global; two bots in one process are fully independent.
//!
//! ```rust,ignore
//! use telebot_runtime::prelude::*;
//!
//! async fn parrot(api: Api, message: Message) {
//!     let text = message.text.clone().unwrap_or_default();
//!     api.send_message(message.chat_id(), text).await;
//! }
//!
//! let mut bot = TeleBot::new("parrot", TelebotConfig::with_api_key(key))?;
//! bot.route("(?!/).+", parrot)?;
//! bot.run().await?;
//! ```

use std::convert::Infallible;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span};

use telebot_core::{
    Api, ApiResponse, BoxedTransport, Handler, HandlerResult, InvalidPatternError, Message,
    RuleOptions, RuleRegistry, Update, UpdateDispatcher, User,
};

use crate::config::TelebotConfig;
use crate::error::{BotError, BotResult};
use crate::poll::{PollOptions, PollState};

/// Full registration form for [`TeleBot::route_with`].
#[derive(Debug, Clone)]
pub struct Route {
    pattern: String,
    endpoint: Option<String>,
    options: RuleOptions,
}

impl Route {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            endpoint: None,
            options: RuleOptions::new(),
        }
    }

    /// Names the rule.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Attaches an opaque option, visible to handlers through `RuleInfo`.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// A long-polling chat bot.
pub struct TeleBot {
    name: String,
    config: TelebotConfig,
    api: Api,
    dispatcher: UpdateDispatcher,
    whoami: Option<User>,
    state: watch::Sender<PollState>,
}

impl TeleBot {
    /// Creates a bot talking HTTP to the API configured in `config`.
    ///
    /// The configuration is validated first. A missing credential is not an
    /// error yet; [`poll`](Self::poll) rejects it.
    #[cfg(feature = "http-client")]
    pub fn new(name: impl Into<String>, config: TelebotConfig) -> BotResult<Self> {
        use telebot_transport::{HttpTransport, HttpTransportConfig};

        crate::config::validate_config(&config)?;

        let transport_config = HttpTransportConfig::new(config.api_key().unwrap_or_default())
            .api_base(config.transport.api_base.clone())
            .timeout(config.transport.timeout());
        let transport = HttpTransport::new(transport_config)
            .map_err(|e| BotError::Configuration(e.to_string()))?;

        Ok(Self::with_transport(
            name,
            config,
            std::sync::Arc::new(transport),
        ))
    }

    /// Creates a bot from the configuration found by
    /// [`ConfigLoader`](crate::config::ConfigLoader) defaults.
    #[cfg(feature = "http-client")]
    pub fn from_env(name: impl Into<String>) -> BotResult<Self> {
        let config = crate::config::load_config()?;
        Self::new(name, config)
    }

    /// Creates a bot over an arbitrary transport.
    pub fn with_transport(
        name: impl Into<String>,
        config: TelebotConfig,
        transport: BoxedTransport,
    ) -> Self {
        let name = name.into();
        debug!(bot = %name, "Creating bot");
        Self {
            name,
            config,
            api: Api::new(transport),
            dispatcher: UpdateDispatcher::new(),
            whoami: None,
            state: watch::Sender::new(PollState::Idle),
        }
    }

    /// The application name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &TelebotConfig {
        &self.config
    }

    /// The outbound API handle.
    pub fn api(&self) -> &Api {
        &self.api
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers `handler` for texts matching `pattern` and hands the handler
    /// back unchanged.
    pub fn route<H, T>(&mut self, pattern: &str, handler: H) -> Result<H, InvalidPatternError>
    where
        H: Handler<T>,
        T: 'static,
    {
        self.route_with(Route::new(pattern), handler)
    }

    /// Registers `handler` with an endpoint name and options.
    pub fn route_with<H, T>(&mut self, route: Route, handler: H) -> Result<H, InvalidPatternError>
    where
        H: Handler<T>,
        T: 'static,
    {
        self.add_update_rule(&route.pattern, route.endpoint, handler.clone(), route.options)?;
        Ok(handler)
    }

    /// Appends a rule to the registry.
    pub fn add_update_rule<H, T>(
        &mut self,
        pattern: &str,
        endpoint: Option<String>,
        handler: H,
        options: RuleOptions,
    ) -> Result<(), InvalidPatternError>
    where
        H: Handler<T>,
        T: 'static,
    {
        self.dispatcher
            .rules_mut()
            .register(pattern, handler, endpoint, options)
    }

    /// Registered rules in registration order.
    pub fn rules(&self) -> &RuleRegistry {
        self.dispatcher.rules()
    }

    // =========================================================================
    // State
    // =========================================================================

    /// The next update id that will be requested.
    pub fn offset(&self) -> i64 {
        self.dispatcher.offset()
    }

    /// The cached bot identity, once fetched.
    pub fn whoami(&self) -> Option<&User> {
        self.whoami.as_ref()
    }

    /// Sets the identity, skipping the fetch on the next start.
    pub fn set_whoami(&mut self, user: User) {
        self.whoami = Some(user);
    }

    /// Forgets the identity so the next start fetches it again.
    pub fn clear_whoami(&mut self) {
        self.whoami = None;
    }

    /// Current polling loop state.
    pub fn state(&self) -> PollState {
        *self.state.borrow()
    }

    /// Watches the polling loop state from another task.
    pub fn subscribe_state(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: PollState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(bot = %self.name, from = %previous, to = %state, "Poll state changed");
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Fetches the bot identity unless it is already known.
    ///
    /// An identity that is already set is never overwritten.
    pub async fn start(&mut self) -> BotResult<&User> {
        if self.whoami.is_none() {
            let me = self.api.get_me().await;
            let user = match me {
                ApiResponse {
                    ok: true,
                    result: Some(user),
                    ..
                } => user,
                other => {
                    let reason = other.failure_reason().to_string();
                    error!(bot = %self.name, reason = %reason, "Identity request failed");
                    return Err(BotError::Authentication(reason));
                }
            };
            info!(
                bot = %self.name,
                id = user.id,
                username = user.username.as_deref().unwrap_or(""),
                "Bot identity confirmed"
            );
            self.whoami = Some(user);
        }

        self.whoami
            .as_ref()
            .ok_or_else(|| BotError::Authentication("identity unavailable".to_string()))
    }

    /// Dispatches one update. See [`UpdateDispatcher::process_update`].
    pub async fn process_update(&mut self, update: Update) -> HandlerResult {
        self.dispatcher.process_update(&self.api, update).await
    }

    /// Dispatches a fetched batch. A failed batch is ignored and updates that
    /// do not decode are skipped after advancing the offset.
    pub async fn process_updates(&mut self, batch: ApiResponse<Vec<Value>>) -> HandlerResult {
        self.dispatcher.process_updates(&self.api, batch).await
    }

    /// Sends a text message through the bot's API handle.
    pub async fn send_message(&self, chat_id: i64, text: impl Into<String>) -> ApiResponse<Message> {
        self.api.send_message(chat_id, text).await
    }

    /// Polls with options from the `[polling]` configuration section.
    pub async fn run(&mut self) -> BotResult<Infallible> {
        let options = PollOptions::from_config(&self.config.polling);
        self.poll(options).await
    }

    /// Runs the polling loop.
    ///
    /// Fails immediately with [`BotError::Configuration`] when no credential is
    /// configured and with [`BotError::Authentication`] when the identity
    /// request is rejected. After that the loop never ends on its own: a
    /// failed cycle is logged and followed by a `cooldown` pause, unless
    /// `debug` is set, in which case the failure is returned.
    pub async fn poll(&mut self, options: PollOptions) -> BotResult<Infallible> {
        self.set_state(PollState::Validating);
        if self.config.api_key().is_none() {
            self.set_state(PollState::Idle);
            return Err(BotError::Configuration(
                "config api_key is undefined".to_string(),
            ));
        }

        let explicit = options.offset.filter(|o| *o != 0);
        if let Some(offset) = explicit.or(self.config.default_offset()) {
            self.dispatcher.set_offset(offset);
        }

        self.set_state(PollState::Starting);
        let started = self.start().await.map(|_| ());
        if let Err(e) = started {
            self.set_state(PollState::Idle);
            return Err(e);
        }

        info!(
            bot = %self.name,
            offset = self.offset(),
            poll_timeout = ?options.poll_timeout,
            debug = options.debug,
            "Polling for updates"
        );

        loop {
            self.set_state(PollState::Polling);
            let span = info_span!("poll_cycle", bot = %self.name, offset = self.offset());

            let Err(e) = self.poll_once(options.poll_timeout).instrument(span).await else {
                continue;
            };

            if options.debug {
                error!(bot = %self.name, error = %e, "Polling cycle failed");
                self.set_state(PollState::Idle);
                return Err(e);
            }

            error!(
                bot = %self.name,
                error = %e,
                cooldown = ?options.cooldown,
                "Polling cycle failed, cooling down"
            );
            self.set_state(PollState::Backoff);
            tokio::time::sleep(options.cooldown).await;
        }
    }

    async fn poll_once(&mut self, poll_timeout: Duration) -> BotResult<()> {
        let batch = self.api.get_updates(poll_timeout, self.offset()).await;
        if !batch.ok {
            return Err(BotError::PollFetch(batch.failure_reason().to_string()));
        }

        debug!(
            count = batch.result.as_ref().map_or(0, Vec::len),
            "Fetched updates"
        );
        self.dispatcher.process_updates(&self.api, batch).await?;
        Ok(())
    }
}

impl std::fmt::Debug for TeleBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeleBot")
            .field("name", &self.name)
            .field("rules", &self.rules().len())
            .field("offset", &self.offset())
            .field("whoami", &self.whoami)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use telebot_core::RuleInfo;
    use telebot_core::testing::MockTransport;

    fn bot(transport: &MockTransport, api_key: Option<&str>) -> TeleBot {
        let config = TelebotConfig {
            api_key: api_key.map(str::to_string),
            ..Default::default()
        };
        TeleBot::with_transport("test", config, transport.clone().boxed())
    }

    fn identity() -> serde_json::Value {
        json!({"ok": true, "result": {"id": 7, "is_bot": true, "first_name": "Test", "username": "test_bot"}})
    }

    fn quick() -> PollOptions {
        PollOptions::default()
            .poll_timeout(Duration::from_secs(1))
            .cooldown(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_route_returns_handler_and_registers() {
        let transport = MockTransport::new();
        let mut bot = bot(&transport, Some("k"));

        async fn noop() {}
        let returned = bot.route("a", noop).unwrap();
        returned().await;
        let _admin = bot
            .route_with(
                Route::new("b").endpoint("second").option("admin", true),
                |info: RuleInfo| async move {
                    match (info.endpoint.as_deref(), info.option("admin")) {
                        (Some("second"), Some(Value::Bool(true))) => Ok(()),
                        other => Err(format!("unexpected rule info: {other:?}")),
                    }
                },
            )
            .unwrap();

        assert_eq!(bot.rules().len(), 2);
        assert_eq!(bot.rules().all()[1].endpoint(), Some("second"));
        assert!(bot.route("(", noop).is_err());
        assert_eq!(bot.rules().len(), 2);

        let update: Update = serde_json::from_value(json!({
            "update_id": 1,
            "message": {"message_id": 1, "text": "b", "chat": {"id": 1}}
        }))
        .unwrap();
        bot.process_update(update).await.unwrap();
    }

    #[tokio::test]
    async fn test_poll_without_api_key_fails_before_any_request() {
        let transport = MockTransport::new();
        let mut bot = bot(&transport, None);

        let err = bot.poll(quick()).await.unwrap_err();

        assert!(matches!(err, BotError::Configuration(_)));
        assert!(transport.calls().is_empty());
        assert_eq!(bot.state(), PollState::Idle);
    }

    #[tokio::test]
    async fn test_rejected_identity_is_authentication_error() {
        let transport = MockTransport::new();
        transport.respond("getMe", json!({"ok": false, "description": "Unauthorized"}));
        let mut bot = bot(&transport, Some("bad"));

        let err = bot.poll(quick()).await.unwrap_err();

        assert!(matches!(err, BotError::Authentication(ref r) if r == "Unauthorized"));
        assert!(bot.whoami().is_none());
        assert!(transport.calls_to("getUpdates").is_empty());
    }

    #[tokio::test]
    async fn test_start_does_not_overwrite_identity() {
        let transport = MockTransport::new();
        transport.respond("getMe", identity());
        let mut bot = bot(&transport, Some("k"));

        assert_eq!(bot.start().await.unwrap().id, 7);
        bot.set_whoami(User {
            id: 99,
            first_name: "Manual".into(),
            ..Default::default()
        });
        assert_eq!(bot.start().await.unwrap().id, 99);
        assert_eq!(transport.calls_to("getMe").len(), 1);

        bot.clear_whoami();
        assert!(matches!(
            bot.start().await,
            Err(BotError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_debug_mode_returns_fetch_failure() {
        let transport = MockTransport::new();
        transport.respond("getMe", identity());
        transport.respond("getUpdates", json!({"ok": false, "error": "boom"}));
        let mut bot = bot(&transport, Some("k"));

        let err = bot.poll(quick().debug(true)).await.unwrap_err();

        assert!(matches!(err, BotError::PollFetch(_)));
        assert!(err.to_string().contains("boom"));
        assert_eq!(bot.state(), PollState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_debug_mode_cools_down_and_retries() {
        let transport = MockTransport::new();
        transport.respond("getMe", identity());
        transport.when_exhausted("getUpdates", json!({"ok": false, "error": "boom"}));
        let mut bot = bot(&transport, Some("k"));
        let state = bot.subscribe_state();

        let outcome = tokio::time::timeout(Duration::from_secs(12), bot.poll(quick())).await;

        assert!(outcome.is_err(), "poll must keep running");
        // Fetches at t=0, 5 and 10.
        assert_eq!(transport.calls_to("getUpdates").len(), 3);
        assert_eq!(*state.borrow(), PollState::Backoff);
    }

    #[tokio::test]
    async fn test_explicit_offset_overrides_config_offset() {
        let transport = MockTransport::new();
        transport.respond("getMe", identity());
        transport.respond("getUpdates", json!({"ok": false, "error": "stop"}));
        let config = TelebotConfig {
            api_key: Some("k".into()),
            offset: Some(50),
            ..Default::default()
        };
        let mut bot = TeleBot::with_transport("test", config, transport.clone().boxed());

        let _ = bot.poll(quick().offset(80).debug(true)).await;

        let params = transport.calls_to("getUpdates")[0].params.clone().unwrap();
        assert_eq!(params["offset"], json!(80));
    }

    #[tokio::test]
    async fn test_zero_offset_falls_back_to_config_offset() {
        let transport = MockTransport::new();
        transport.respond("getMe", identity());
        transport.respond("getUpdates", json!({"ok": false, "error": "stop"}));
        let config = TelebotConfig {
            api_key: Some("k".into()),
            offset: Some(50),
            ..Default::default()
        };
        let mut bot = TeleBot::with_transport("test", config, transport.clone().boxed());

        let _ = bot.poll(quick().offset(0).debug(true)).await;

        let params = transport.calls_to("getUpdates")[0].params.clone().unwrap();
        assert_eq!(params["offset"], json!(50));
        assert_eq!(params["timeout"], json!(1));
    }

    #[tokio::test]
    async fn test_handler_failure_is_returned_in_debug_mode() {
        let transport = MockTransport::new();
        transport.respond("getMe", identity());
        transport.respond(
            "getUpdates",
            json!({"ok": true, "result": [
                {"update_id": 3, "message": {"message_id": 1, "text": "crash", "chat": {"id": 1}}},
                {"update_id": 4, "message": {"message_id": 2, "text": "after", "chat": {"id": 1}}}
            ]}),
        );
        let mut bot = bot(&transport, Some("k"));
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        bot.add_update_rule(
            ".+",
            None,
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("handler crashed")
                }
            },
            RuleOptions::new(),
        )
        .unwrap();

        let err = bot.poll(quick().debug(true)).await.unwrap_err();

        assert!(matches!(err, BotError::Handler(_)));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(bot.offset(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offset_is_not_rolled_back_after_handler_failure() {
        let transport = MockTransport::new();
        transport.respond("getMe", identity());
        transport.respond(
            "getUpdates",
            json!({"ok": true, "result": [
                {"update_id": 10, "message": {"message_id": 1, "text": "crash", "chat": {"id": 1}}}
            ]}),
        );
        transport.when_exhausted("getUpdates", json!({"ok": false, "error": "offline"}));
        let mut bot = bot(&transport, Some("k"));
        bot.add_update_rule(
            "crash",
            None,
            || async { Err::<(), _>("handler crashed") },
            RuleOptions::new(),
        )
        .unwrap();

        let _ = tokio::time::timeout(Duration::from_secs(12), bot.poll(quick())).await;

        let offsets: Vec<_> = transport
            .calls_to("getUpdates")
            .into_iter()
            .map(|c| c.params.unwrap()["offset"].clone())
            .collect();
        assert_eq!(offsets, [json!(0), json!(11), json!(11)]);
    }

    #[tokio::test]
    async fn test_malformed_update_does_not_stall_polling() {
        let transport = MockTransport::new();
        transport.respond("getMe", identity());
        transport.respond(
            "getUpdates",
            json!({"ok": true, "result": [
                {"update_id": 1, "message": {"message_id": 1, "text": "hello", "chat": {"id": 1}}},
                {"update_id": 2, "message": {"message_id": 2, "text": 5, "chat": {"id": 1}}}
            ]}),
        );
        transport.respond("getUpdates", json!({"ok": false, "error": "stop"}));
        let mut bot = bot(&transport, Some("k"));
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        bot.add_update_rule(
            ".+",
            None,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(())
            },
            RuleOptions::new(),
        )
        .unwrap();

        let err = bot.poll(quick().debug(true)).await.unwrap_err();

        assert!(err.to_string().contains("stop"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(bot.offset(), 3);
        let fetches = transport.calls_to("getUpdates");
        assert_eq!(fetches[1].params.as_ref().unwrap()["offset"], json!(3));
    }
}
