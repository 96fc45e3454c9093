//! # Telebot
//!
//! A long-polling chat bot framework: register text patterns, get your async
//! handlers called with the matching messages.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   getUpdates   ┌────────────────┐   every match   ┌──────────┐
//! │ Polling loop │──────────────▶│ UpdateDispatcher│───────────────▶│ Handlers │──▶ Api
//! │  (TeleBot)   │◀── offset ─────│  (rule order)   │                 └──────────┘
//! └──────────────┘                └────────────────┘
//! ```
//!
//! - **TeleBot**: owns the offset and identity, runs the loop with cooldown on failure
//! - **Rules**: start-anchored regex patterns; every matching rule fires, in order
//! - **Handlers**: async functions with extractor parameters (Axum-style)
//! - **Transport**: HTTP by default; failures always arrive as `{ ok: false, error }`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use telebot::prelude::*;
//!
//! async fn parrot(api: Api, message: Message) {
//!     let text = message.text.clone().unwrap_or_default();
//!     api.send_message(message.chat_id(), format!("Parrot Says: {text}")).await;
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut bot = TeleBot::from_env("parrot")?;
//!     bot.route("(?!/).+", parrot)?;
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default), `yaml-config`: configuration file formats
//! - `http-client` (default): reqwest-based transport
//! - `json-log`: JSON log output
//! - `testing`: scripted in-memory transport for application tests

pub use telebot_core as core;
pub use telebot_runtime as runtime;
pub use telebot_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use telebot::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use telebot_runtime::{
        BotError, BotResult, ConfigLoader, PollOptions, PollState, Route, TeleBot, TelebotConfig,
        logging,
    };

    // Extractors - for handler parameters
    pub use telebot_core::{Api, Args, Captures, FromCall, Named, RuleInfo, UpdateId};

    // Data model
    pub use telebot_core::{ApiResponse, Chat, Message, RuleOptions, Update, User};

    // Custom transports
    pub use telebot_core::{ApiRequest, Method, Transport};
}
