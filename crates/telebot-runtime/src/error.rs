//! Runtime error types.

use thiserror::Error;

use telebot_core::{HandlerError, InvalidPatternError};

use crate::config::ConfigError;

/// Errors surfaced by [`TeleBot`](crate::TeleBot).
///
/// `Configuration` and `Authentication` always reach the caller. The
/// per-cycle kinds, `PollFetch` and `Handler`, only escape the polling loop
/// in debug mode.
#[derive(Error, Debug)]
pub enum BotError {
    /// A required setting, usually the credential, is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Loading or validating the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The identity request was rejected.
    #[error("Bot cannot request information, check api_key: {0}")]
    Authentication(String),

    /// A batch fetch reported failure.
    #[error("failed to fetch updates: {0}")]
    PollFetch(String),

    /// A handler failed while an update was dispatched.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// A rule pattern did not compile.
    #[error(transparent)]
    InvalidPattern(#[from] InvalidPatternError),
}

impl BotError {
    /// Returns whether the polling loop recovers from this error outside
    /// debug mode.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PollFetch(_) | Self::Handler(_))
    }
}

/// Result type for bot operations.
pub type BotResult<T> = Result<T, BotError>;
