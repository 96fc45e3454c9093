//! Configuration module for the Telebot runtime.
//!
//! Layered loading through figment (defaults, files, `TELEBOT_*` environment
//! variables, programmatic overrides) plus validation of the merged result.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, PollingConfig, SpanEventConfig,
    TelebotConfig, TransportConfig,
};
pub use validation::validate_config;
