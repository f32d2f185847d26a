use crate::config::types::{Config, ExtractConfig, FetchConfig, PipelineConfig};
use crate::ConfigError;

/// Upper bound on concurrent requests inside the fetch stage
const MAX_FETCH_CONCURRENCY: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_extract_config(&config.extract)?;
    validate_pipeline_config(&config.pipeline)?;
    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    let timeouts = [
        ("connect-timeout-secs", config.connect_timeout_secs),
        (
            "response-header-timeout-secs",
            config.response_header_timeout_secs,
        ),
        ("request-timeout-secs", config.request_timeout_secs),
    ];
    for (name, secs) in timeouts {
        if secs == 0 {
            return Err(ConfigError::Validation(format!(
                "{} must be at least 1 second",
                name
            )));
        }
    }

    if config.concurrency < 1 || config.concurrency > MAX_FETCH_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_FETCH_CONCURRENCY, config.concurrency
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates link extraction configuration
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    if config.rules.is_empty() {
        return Err(ConfigError::Validation(
            "at least one extraction rule is required".to_string(),
        ));
    }

    for scheme in &config.accepted_schemes {
        validate_scheme(scheme)?;
    }

    Ok(())
}

/// Validates pipeline configuration
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.channel_capacity < 1 {
        return Err(ConfigError::Validation(
            "channel-capacity must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates a URL scheme name (RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ))
fn validate_scheme(scheme: &str) -> Result<(), ConfigError> {
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    if !valid {
        return Err(ConfigError::Validation(format!(
            "Invalid URL scheme '{}'",
            scheme
        )));
    }

    Ok(())
}
