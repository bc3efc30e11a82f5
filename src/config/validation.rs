//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Smallest usable line limit; `/register <nick>` must fit on one line.
const MIN_BUFFER_SIZE: usize = 16;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("host is required")]
    MissingHost,
    #[error("buffer_size must be at least {}, got {}", MIN_BUFFER_SIZE, .0)]
    BufferTooSmall(usize),
    #[error("unknown log_level '{0}'")]
    UnknownLogLevel(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.host.trim().is_empty() {
        errors.push(ValidationError::MissingHost);
    }
    if config.buffer_size < MIN_BUFFER_SIZE {
        errors.push(ValidationError::BufferTooSmall(config.buffer_size));
    }
    if config.tracing_directive().is_none() {
        errors.push(ValidationError::UnknownLogLevel(config.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
