//! Polling loop options and observable state.

use std::time::Duration;

use crate::config::PollingConfig;

/// Parameters of one [`TeleBot::poll`](crate::TeleBot::poll) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// Starting offset. `None` and `Some(0)` both fall back to the configured
    /// default offset, then to the bot's current offset.
    pub offset: Option<i64>,
    /// Long-poll hold time sent with every fetch.
    pub poll_timeout: Duration,
    /// Pause after a failed cycle.
    pub cooldown: Duration,
    /// Return the first cycle failure instead of cooling down.
    pub debug: bool,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}

impl PollOptions {
    /// Reads timeouts and the debug flag from the `[polling]` section.
    pub fn from_config(config: &PollingConfig) -> Self {
        Self {
            offset: None,
            poll_timeout: Duration::from_secs(config.poll_timeout_secs),
            cooldown: Duration::from_secs(config.cooldown_secs),
            debug: config.debug,
        }
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Where the polling loop currently is.
///
/// ```text
/// Idle -> Validating -> Starting -> Polling <-> Backoff
/// ```
///
/// The loop returns to `Idle` only when `poll` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PollState {
    #[default]
    Idle,
    /// Checking the credential and resolving the offset.
    Validating,
    /// Fetching the bot identity.
    Starting,
    /// Fetching or dispatching a batch.
    Polling,
    /// Sleeping after a failed cycle.
    Backoff,
}

impl std::fmt::Display for PollState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Validating => write!(f, "Validating"),
            Self::Starting => write!(f, "Starting"),
            Self::Polling => write!(f, "Polling"),
            Self::Backoff => write!(f, "Backoff"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PollOptions::default();
        assert_eq!(options.offset, None);
        assert_eq!(options.poll_timeout, Duration::from_secs(600));
        assert_eq!(options.cooldown, Duration::from_secs(60));
        assert!(!options.debug);
    }

    #[test]
    fn test_from_config() {
        let config = PollingConfig {
            poll_timeout_secs: 30,
            cooldown_secs: 2,
            debug: true,
        };
        let options = PollOptions::from_config(&config).offset(5);
        assert_eq!(options.poll_timeout, Duration::from_secs(30));
        assert_eq!(options.cooldown, Duration::from_secs(2));
        assert!(options.debug);
        assert_eq!(options.offset, Some(5));
    }
}
