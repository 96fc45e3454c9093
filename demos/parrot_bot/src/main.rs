//! Parrot Bot Example
//!
//! Two rules, both checked against every incoming text:
//!
//! - `/command ?(.*)` answers with the captured argument
//! - `(?!/).+` repeats any text that is not a command
//!
//! # Usage
//!
//! ```bash
//! TELEBOT_API_KEY=123456:abc cargo run --package parrot-bot
//! cargo run --package parrot-bot -- --config ./telebot.toml --debug
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use telebot::prelude::*;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(version, about = "Parrot bot for the Telebot framework")]
struct Cli {
    /// Configuration file (defaults to searching for telebot.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bot credential, overriding the configuration.
    #[arg(long, env = "TELEBOT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Starting offset.
    #[arg(long)]
    offset: Option<i64>,

    /// Seconds to wait after a failed polling cycle.
    #[arg(long)]
    cooldown: Option<u64>,

    /// Stop on the first failure instead of retrying.
    #[arg(long)]
    debug: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Answers `/command <arg>`.
async fn example_command(api: Api, message: Message, Args(args): Args) -> Result<()> {
    let cmd = args.first().map(String::as_str).unwrap_or_default();
    let reply = format!("Command Recieved: {cmd}");

    api.send_message(message.chat_id(), reply)
        .await
        .into_result()
        .map_err(anyhow::Error::msg)?;
    Ok(())
}

/// Repeats everything that is not a command.
async fn parrot(api: Api, message: Message) {
    let text = message.text.as_deref().unwrap_or_default();
    let reply = format!("Parrot Says: {text}");

    if let Err(e) = api.send_message(message.chat_id(), reply).await.into_result() {
        error!(chat_id = message.chat_id(), error = %e, "Failed to send parrot reply");
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    let mut config = loader.load()?;
    if let Some(api_key) = cli.api_key {
        config.api_key = Some(api_key);
    }

    logging::init_from_config(&config.logging);

    let mut options = PollOptions::from_config(&config.polling);
    if let Some(offset) = cli.offset {
        options = options.offset(offset);
    }
    if let Some(cooldown) = cli.cooldown {
        options = options.cooldown(Duration::from_secs(cooldown));
    }
    let debug = options.debug || cli.debug;
    options = options.debug(debug);

    let mut bot = TeleBot::new("parrot", config)?;
    bot.route("/command ?(.*)", example_command)?;
    bot.route("(?!/).+", parrot)?;

    info!(rules = bot.rules().len(), "Starting parrot bot");
    bot.poll(options).await?;

    Ok(())
}
