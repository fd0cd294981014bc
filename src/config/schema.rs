//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the call engine.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the call engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Logical service name. Used as the default limiter key.
    pub service: String,

    /// Interchangeable base URLs of the service, in preference order.
    pub endpoints: Vec<String>,

    /// Retry and backoff configuration.
    pub retries: RetryConfig,

    /// Relocation (failover/redirect) bounds.
    pub relocation: RelocationConfig,

    /// Adaptive concurrency limiter settings.
    pub limiter: LimiterConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            service: "default".to_string(),
            endpoints: Vec::new(),
            retries: RetryConfig::default(),
            relocation: RelocationConfig::default(),
            limiter: LimiterConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries. When disabled every call gets a single attempt per endpoint.
    pub enabled: bool,

    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Apply random jitter to each delay.
    pub jitter: bool,

    /// Upper bound on a server-requested `Retry-After` wait, in milliseconds.
    pub max_retry_after_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            base_delay_ms: 250,
            max_delay_ms: 5000,
            jitter: true,
            max_retry_after_ms: 30_000,
        }
    }
}

/// Relocation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelocationConfig {
    /// Hard cap on endpoint switches within one logical call.
    pub max_relocations: u32,
}

impl Default for RelocationConfig {
    fn default() -> Self {
        Self { max_relocations: 20 }
    }
}

/// What the limiter does when every slot is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionMode {
    /// Suspend the caller until a permit frees up.
    Blocking,
    /// Refuse immediately; the call treats it as throttling.
    Rejecting,
}

/// Adaptive concurrency limiter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimiterConfig {
    /// Enable admission control.
    pub enabled: bool,

    /// Blocking or rejecting admission.
    pub mode: AdmissionMode,

    /// Starting concurrency limit.
    pub initial_limit: usize,

    /// Floor for the limit (at least 1).
    pub min_limit: usize,

    /// Ceiling for the limit.
    pub max_limit: usize,

    /// Sampling window length in milliseconds.
    pub window_ms: u64,

    /// Roll the window early once this many samples are recorded.
    pub window_samples: usize,

    /// Queue estimate below which the limit grows.
    pub alpha: f64,

    /// Queue estimate above which the limit shrinks.
    pub beta: f64,

    /// Multiplicative decrease factor, in (0, 1).
    pub backoff_ratio: f64,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: AdmissionMode::Blocking,
            initial_limit: 10,
            min_limit: 1,
            max_limit: 1000,
            window_ms: 1000,
            window_samples: 100,
            alpha: 3.0,
            beta: 6.0,
            backoff_ratio: 0.9,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Deadline for a single attempt (request sent, response body read).
    pub attempt_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 2000,
            attempt_ms: 10_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
