//! Telebot Runtime - orchestration layer for the Telebot framework.
//!
//! This crate provides:
//! - The [`TeleBot`] instance: rule registration, identity priming and the
//!   long-polling loop
//! - Layered configuration loading and validation ([`config`])
//! - Logging setup ([`logging`])
//!
//! # Polling
//!
//! ```ignore
//! use telebot_runtime::prelude::*;
//!
//! async fn command(api: Api, message: Message, Args(args): Args) {
//!     api.send_message(message.chat_id(), args.join(" ")).await;
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().load()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let mut bot = TeleBot::new("my-bot", config)?;
//!     bot.route("/command ?(.*)", command)?;
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Failure Handling
//!
//! A missing credential or a rejected identity request stops `poll` before
//! the loop starts. Inside the loop, a failed fetch or a failing handler is
//! logged and retried after the cooldown; with `debug` enabled it is
//! returned to the caller instead.

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod poll;

// Re-exports
pub use bot::{Route, TeleBot};
pub use config::{ConfigError, ConfigLoader, ConfigResult, TelebotConfig, validate_config};
pub use error::{BotError, BotResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use poll::{PollOptions, PollState};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::logging;
    pub use crate::{
        BotError, BotResult, ConfigLoader, PollOptions, PollState, Route, TeleBot, TelebotConfig,
    };
    pub use telebot_core::{
        Api, ApiResponse, Args, Captures, Message, Named, RuleInfo, RuleOptions, Update, UpdateId,
        User,
    };
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
