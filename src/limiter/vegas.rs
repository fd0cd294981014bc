//! Latency-gradient limit rule.
//!
//! Compares the window's minimum RTT against its average RTT. The ratio is
//! the gradient; `limit * (1 - gradient)` estimates how many requests are
//! queued rather than being served.
//!
//! ```text
//! drop in window          → limit * backoff_ratio
//! queue < alpha           → limit + 1   (unless the window never used half the limit)
//! queue > beta            → limit * backoff_ratio
//! otherwise               → unchanged
//! ```

use crate::config::LimiterConfig;
use crate::limiter::SampleWindow;

#[derive(Debug, Clone)]
pub struct VegasLimit {
    min_limit: usize,
    max_limit: usize,
    alpha: f64,
    beta: f64,
    backoff_ratio: f64,
}

impl VegasLimit {
    pub fn new(config: &LimiterConfig) -> Self {
        Self {
            min_limit: config.min_limit.max(1),
            max_limit: config.max_limit.max(config.min_limit.max(1)),
            alpha: config.alpha,
            beta: config.beta,
            backoff_ratio: config.backoff_ratio,
        }
    }

    /// New limit after observing `window` at limit `limit`.
    pub fn update(&self, limit: usize, window: &SampleWindow) -> usize {
        let next = if window.did_drop() {
            self.decrease(limit)
        } else {
            match (window.min_rtt(), window.average_rtt()) {
                (Some(min), Some(avg)) => {
                    let gradient = (min.as_secs_f64() / avg.as_secs_f64()).clamp(0.0, 1.0);
                    let queue = limit as f64 * (1.0 - gradient);
                    if queue < self.alpha {
                        // App-limited: the window never pushed against the limit.
                        if window.max_in_flight() * 2 < limit {
                            limit
                        } else {
                            limit + 1
                        }
                    } else if queue > self.beta {
                        self.decrease(limit)
                    } else {
                        limit
                    }
                }
                _ => limit,
            }
        };
        next.clamp(self.min_limit, self.max_limit)
    }

    /// Multiplicative decrease that always moves by at least one.
    fn decrease(&self, limit: usize) -> usize {
        let scaled = (limit as f64 * self.backoff_ratio).floor() as usize;
        scaled.min(limit.saturating_sub(1))
    }

    pub fn min_limit(&self) -> usize {
        self.min_limit
    }

    pub fn max_limit(&self) -> usize {
        self.max_limit
    }
}
