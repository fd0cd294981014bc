//! Backoff policies.
//!
//! A policy is a pure function from retry index to delay. The per-call
//! position lives in [`Backoff`], so one policy instance can be shared by
//! every call on an engine.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Produces the wait before retry number `attempt` (zero-based).
///
/// Returns `None` once retries are exhausted.
pub trait BackoffPolicy: Send + Sync + std::fmt::Debug {
    fn next_backoff(&self, attempt: u32) -> Option<Duration>;
}

/// Never retries.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverRetry;

impl BackoffPolicy for NeverRetry {
    fn next_backoff(&self, _attempt: u32) -> Option<Duration> {
        None
    }
}

/// Exponential backoff with an upper bound and optional jitter.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    cap: Duration,
    max_retries: u32,
    jitter: bool,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, cap: Duration, max_retries: u32) -> Self {
        Self {
            base,
            cap,
            max_retries,
            jitter: false,
        }
    }

    /// Shave up to 10% off each delay at random.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn next_backoff(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }

        let base_ms = self.base.as_millis() as u64;
        let cap_ms = self.cap.as_millis() as u64;
        let exponential_base = 2u64.saturating_pow(attempt);
        let capped_delay = base_ms.saturating_mul(exponential_base).min(cap_ms);

        let jitter_range = capped_delay / 10;
        let jitter = if self.jitter && jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Some(Duration::from_millis(capped_delay - jitter))
    }
}

/// An explicit list of delays, one per retry.
#[derive(Debug, Clone, Default)]
pub struct FixedSchedule {
    delays: Vec<Duration>,
}

impl FixedSchedule {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }
}

impl BackoffPolicy for FixedSchedule {
    fn next_backoff(&self, attempt: u32) -> Option<Duration> {
        self.delays.get(attempt as usize).copied()
    }
}

/// Build the shared policy described by the retry configuration.
pub fn policy_from_config(config: &RetryConfig) -> Arc<dyn BackoffPolicy> {
    if !config.enabled || config.max_retries == 0 {
        return Arc::new(NeverRetry);
    }
    Arc::new(
        ExponentialBackoff::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.max_retries,
        )
        .with_jitter(config.jitter),
    )
}

/// Per-call cursor over a shared policy.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: Arc<dyn BackoffPolicy>,
    position: u32,
}

impl Backoff {
    pub fn new(policy: Arc<dyn BackoffPolicy>) -> Self {
        Self {
            policy,
            position: 0,
        }
    }

    /// Consume one retry slot, returning the policy's delay for it.
    pub fn next_delay(&mut self) -> Option<Duration> {
        let delay = self.policy.next_backoff(self.position)?;
        self.position += 1;
        Some(delay)
    }

    /// Retries consumed so far.
    pub fn position(&self) -> u32 {
        self.position
    }
}
