//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint URLs (absolute http/https)
//! - Validate value ranges (limits ordered, ratios in range, timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the engine

use thiserror::Error;
use url::Url;

use crate::config::schema::EngineConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("at least one endpoint is required")]
    NoEndpoints,

    #[error("endpoint '{0}' is not a valid URL")]
    InvalidEndpoint(String),

    #[error("endpoint '{0}' must use http or https")]
    UnsupportedScheme(String),

    #[error("limiter bounds must satisfy 1 <= min ({min}) <= initial ({initial}) <= max ({max})")]
    LimiterBounds { min: usize, initial: usize, max: usize },

    #[error("limiter backoff_ratio {0} must be in (0, 1)")]
    BackoffRatio(f64),

    #[error("limiter alpha ({alpha}) must be below beta ({beta})")]
    QueueThresholds { alpha: f64, beta: f64 },

    #[error("limiter window must be non-zero")]
    EmptyWindow,

    #[error("retry base delay {base_ms}ms exceeds max delay {max_ms}ms")]
    BackoffBounds { base_ms: u64, max_ms: u64 },

    #[error("timeout '{0}' must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("endpoint '{0}' uses TLS, which the built-in HTTP transport does not speak")]
    TlsUnsupported(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.endpoints.is_empty() {
        errors.push(ValidationError::NoEndpoints);
    }
    for endpoint in &config.endpoints {
        match Url::parse(endpoint) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(_) => errors.push(ValidationError::UnsupportedScheme(endpoint.clone())),
            Err(_) => errors.push(ValidationError::InvalidEndpoint(endpoint.clone())),
        }
    }

    let limiter = &config.limiter;
    if limiter.min_limit < 1
        || limiter.min_limit > limiter.initial_limit
        || limiter.initial_limit > limiter.max_limit
    {
        errors.push(ValidationError::LimiterBounds {
            min: limiter.min_limit,
            initial: limiter.initial_limit,
            max: limiter.max_limit,
        });
    }
    if !(limiter.backoff_ratio > 0.0 && limiter.backoff_ratio < 1.0) {
        errors.push(ValidationError::BackoffRatio(limiter.backoff_ratio));
    }
    if limiter.alpha >= limiter.beta {
        errors.push(ValidationError::QueueThresholds {
            alpha: limiter.alpha,
            beta: limiter.beta,
        });
    }
    if limiter.window_ms == 0 || limiter.window_samples == 0 {
        errors.push(ValidationError::EmptyWindow);
    }

    let retries = &config.retries;
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::BackoffBounds {
            base_ms: retries.base_delay_ms,
            max_ms: retries.max_delay_ms,
        });
    }

    if config.timeouts.attempt_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("attempt_ms"));
    }
    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_ms"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Endpoints the plain-HTTP hyper transport cannot reach.
pub fn validate_plain_http(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let errors: Vec<_> = config
        .endpoints
        .iter()
        .filter(|endpoint| {
            Url::parse(endpoint)
                .map(|url| url.scheme() == "https")
                .unwrap_or(false)
        })
        .map(|endpoint| ValidationError::TlsUnsupported(endpoint.clone()))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
