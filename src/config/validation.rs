use crate::config::types::{
    Config, EmailConfig, FetchConfig, InputConfig, OutputConfig, PipelineConfig,
};
use crate::ConfigError;

const MAX_CONCURRENCY: usize = 64;
const MAX_RETRY_ATTEMPTS: u32 = 10;
const MAX_REDIRECTS: usize = 20;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_input_config(&config.input)?;
    validate_output_config(&config.output)?;
    validate_email_config(&config.email)?;
    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.retry_attempts < 1 || config.retry_attempts > MAX_RETRY_ATTEMPTS {
        return Err(ConfigError::Validation(format!(
            "retry_attempts must be between 1 and {}, got {}",
            MAX_RETRY_ATTEMPTS, config.retry_attempts
        )));
    }

    if config.max_redirects > MAX_REDIRECTS {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be <= {}, got {}",
            MAX_REDIRECTS, config.max_redirects
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates worker pool configuration
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    Ok(())
}

fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "input directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.file_stem.trim().is_empty() {
        return Err(ConfigError::Validation(
            "file_stem cannot be empty".to_string(),
        ));
    }

    if config
        .file_stem
        .chars()
        .any(|c| matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
    {
        return Err(ConfigError::Validation(format!(
            "file_stem contains characters not allowed in file names: '{}'",
            config.file_stem
        )));
    }

    if config.language.trim().is_empty() {
        return Err(ConfigError::Validation(
            "language cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_email_config(config: &EmailConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    if config.smtp_host.trim().is_empty() {
        return Err(ConfigError::Validation(
            "smtp_host cannot be empty when email is enabled".to_string(),
        ));
    }

    if config.smtp_port == 0 {
        return Err(ConfigError::Validation(
            "smtp_port must be > 0".to_string(),
        ));
    }

    Ok(())
}
