//! Limiters keyed by logical target.

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::LimiterConfig;
use crate::limiter::AdmissionController;

/// Hands out one shared [`AdmissionController`] per limiter key.
#[derive(Debug)]
pub struct Limiters {
    config: LimiterConfig,
    inner: DashMap<String, Arc<AdmissionController>>,
}

impl Limiters {
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            config,
            inner: DashMap::new(),
        }
    }

    /// Controller for `key`, created on first use.
    pub fn acquire_limiter(&self, key: &str) -> Arc<AdmissionController> {
        if let Some(existing) = self.inner.get(key) {
            return existing.clone();
        }
        self.inner
            .entry(key.to_string())
            .or_insert_with(|| {
                tracing::debug!(limiter = %key, enabled = self.config.enabled, "Creating concurrency limiter");
                Arc::new(if self.config.enabled {
                    AdmissionController::new(key, &self.config)
                } else {
                    AdmissionController::unbounded(key)
                })
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
