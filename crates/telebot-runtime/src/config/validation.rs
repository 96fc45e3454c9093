//! Configuration validation utilities.
//!
//! Log levels need no check here: unknown level names already fail while
//! the configuration is extracted.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, PollingConfig, TelebotConfig, TransportConfig};

/// Validates the entire configuration.
///
/// A missing `api_key` is accepted here; polling refuses to start without one.
pub fn validate_config(config: &TelebotConfig) -> ConfigResult<()> {
    if let Some(key) = &config.api_key {
        validate_api_key(key)?;
    }
    validate_transport_config(&config.transport)?;
    validate_polling_config(&config.polling)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_api_key(key: &str) -> ConfigResult<()> {
    if key.is_empty() {
        return Err(ConfigError::validation("api_key cannot be empty"));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation("api_key cannot contain whitespace"));
    }
    Ok(())
}

fn validate_transport_config(transport: &TransportConfig) -> ConfigResult<()> {
    validate_url(&transport.api_base)?;

    if transport.timeout_secs == 0 {
        return Err(ConfigError::validation(
            "transport.timeout_secs must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_polling_config(polling: &PollingConfig) -> ConfigResult<()> {
    if polling.poll_timeout_secs == 0 {
        return Err(ConfigError::validation(
            "polling.poll_timeout_secs must be greater than 0",
        ));
    }
    if polling.cooldown_secs == 0 {
        return Err(ConfigError::validation(
            "polling.cooldown_secs must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when output is \"file\"",
        ));
    }
    Ok(())
}

fn validate_url(url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::invalid_url(url, "URL cannot be empty"));
    }

    let valid_schemes = ["http://", "https://"];
    if !valid_schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {valid_schemes:?}"),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&TelebotConfig::default()).is_ok());
        assert!(validate_config(&TelebotConfig::with_api_key("123:abc")).is_ok());
    }

    #[test]
    fn test_validate_api_key() {
        let config = TelebotConfig::with_api_key("123 abc");
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
        assert!(validate_config(&TelebotConfig::with_api_key("")).is_err());
    }

    #[test]
    fn test_validate_api_base_scheme() {
        let mut config = TelebotConfig::default();
        config.transport.api_base = "ftp://api.telegram.org".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_validate_zero_durations() {
        let mut config = TelebotConfig::default();
        config.polling.cooldown_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = TelebotConfig::default();
        config.transport.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = TelebotConfig::default();
        config.logging.output = LogOutput::File;
        config.logging.file_path = None;
        assert!(validate_config(&config).is_err());
    }
}
