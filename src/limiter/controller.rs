//! Admission controller for one logical target.
//!
//! # Responsibilities
//! - Grant permits while in-flight < limit (block or reject otherwise)
//! - Fold completion reports into the current sample window
//! - Roll the window on time or sample count and recompute the limit
//!
//! # Design Decisions
//! - Limit and in-flight count are atomics updated by compare-and-swap
//! - The window is an immutable snapshot behind `ArcSwap`; updates use `rcu`
//!   so no sample is lost to a concurrent swap
//! - One caller claims each rollover by advancing the deadline with CAS
//! - A drop in a window without successes rolls immediately

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::sync::Notify;

use crate::config::{AdmissionMode, LimiterConfig};
use crate::limiter::{Permit, SampleWindow, VegasLimit};
use crate::observability::metrics;

/// Admission refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("limiter '{limiter}' at capacity ({limit} in flight)")]
    CapacityExhausted { limiter: String, limit: usize },
}

/// How a permit holder finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Useful latency sample.
    Success(Duration),
    /// Overloaded, rejected or timed out.
    Dropped,
    /// Cancelled; nothing learned.
    Ignored,
}

/// Adaptive concurrency limiter shared by every call to one target.
#[derive(Debug)]
pub struct AdmissionController {
    name: String,
    mode: AdmissionMode,
    algorithm: Option<VegasLimit>,
    limit: AtomicUsize,
    in_flight: AtomicUsize,
    window: ArcSwap<SampleWindow>,
    window_len: Duration,
    window_samples: usize,
    epoch: Instant,
    /// Nanos since `epoch` at which the current window expires.
    next_rollover: AtomicU64,
    released: Notify,
}

impl AdmissionController {
    pub fn new(name: impl Into<String>, config: &LimiterConfig) -> Self {
        let algorithm = VegasLimit::new(config);
        let initial = config
            .initial_limit
            .clamp(algorithm.min_limit(), algorithm.max_limit());
        let window_len = Duration::from_millis(config.window_ms.max(1));
        let controller = Self {
            name: name.into(),
            mode: config.mode,
            algorithm: Some(algorithm),
            limit: AtomicUsize::new(initial),
            in_flight: AtomicUsize::new(0),
            window: ArcSwap::from_pointee(SampleWindow::default()),
            window_len,
            window_samples: config.window_samples.max(1),
            epoch: Instant::now(),
            next_rollover: AtomicU64::new(nanos(window_len)),
            released: Notify::new(),
        };
        metrics::record_limit(&controller.name, initial);
        controller
    }

    /// A controller that admits everything and learns nothing.
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: AdmissionMode::Rejecting,
            algorithm: None,
            limit: AtomicUsize::new(usize::MAX),
            in_flight: AtomicUsize::new(0),
            window: ArcSwap::from_pointee(SampleWindow::default()),
            window_len: Duration::MAX,
            window_samples: usize::MAX,
            epoch: Instant::now(),
            next_rollover: AtomicU64::new(u64::MAX),
            released: Notify::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> AdmissionMode {
        self.mode
    }

    pub fn limit(&self) -> usize {
        self.limit.load(Ordering::Acquire)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Snapshot of the window being filled.
    pub fn window(&self) -> SampleWindow {
        **self.window.load()
    }

    /// Take a slot if one is free right now.
    pub fn try_acquire(self: &Arc<Self>) -> Option<Permit> {
        let mut prev = self.in_flight.load(Ordering::Acquire);
        loop {
            if prev >= self.limit.load(Ordering::Acquire) {
                return None;
            }
            match self.in_flight.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => prev = actual,
            }
        }
        if self.algorithm.is_some() {
            metrics::record_in_flight(&self.name, prev + 1);
        }
        Some(Permit::new(Arc::clone(self)))
    }

    /// Take a slot, waiting or refusing per the configured mode.
    pub async fn acquire(self: &Arc<Self>) -> Result<Permit, AdmissionError> {
        match self.mode {
            AdmissionMode::Rejecting => self.try_acquire().ok_or_else(|| {
                metrics::record_admission_rejected(&self.name);
                AdmissionError::CapacityExhausted {
                    limiter: self.name.clone(),
                    limit: self.limit(),
                }
            }),
            AdmissionMode::Blocking => loop {
                let notified = self.released.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if let Some(permit) = self.try_acquire() {
                    return Ok(permit);
                }
                tracing::trace!(limiter = %self.name, limit = self.limit(), "Waiting for permit");
                notified.await;
            },
        }
    }

    /// Called exactly once per permit.
    pub(crate) fn release(&self, completion: Completion) {
        let in_flight = self.in_flight.load(Ordering::Acquire);
        match completion {
            Completion::Success(rtt) => self.on_sample(rtt, in_flight),
            Completion::Dropped => self.on_dropped(in_flight),
            Completion::Ignored => {}
        }
        let remaining = self.in_flight.fetch_sub(1, Ordering::AcqRel) - 1;
        if self.algorithm.is_some() {
            metrics::record_in_flight(&self.name, remaining);
        }
        self.released.notify_waiters();
    }

    fn on_sample(&self, rtt: Duration, in_flight: usize) {
        if self.algorithm.is_none() {
            return;
        }
        let previous = self
            .window
            .rcu(|window| Arc::new(window.add_sample(rtt, in_flight)));
        let current = previous.add_sample(rtt, in_flight);
        if self.rollover_due(&current) {
            self.try_rollover(false);
        }
    }

    fn on_dropped(&self, in_flight: usize) {
        if self.algorithm.is_none() {
            return;
        }
        let previous = self
            .window
            .rcu(|window| Arc::new(window.add_dropped(in_flight)));
        let current = previous.add_dropped(in_flight);
        if current.sample_count() == 0 {
            self.try_rollover(true);
        } else if self.rollover_due(&current) {
            self.try_rollover(false);
        }
    }

    fn rollover_due(&self, window: &SampleWindow) -> bool {
        window.event_count() >= self.window_samples
            || self.now_nanos() >= self.next_rollover.load(Ordering::Acquire)
    }

    /// Claim the rollover and apply it. With `drop_only`, keeps trying while
    /// the live window still holds drops without successes.
    fn try_rollover(&self, drop_only: bool) {
        loop {
            let deadline = self.next_rollover.load(Ordering::Acquire);
            let now = self.now_nanos();
            let next = now.saturating_add(nanos(self.window_len));
            if self
                .next_rollover
                .compare_exchange(deadline, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.roll(|window| {
                    (drop_only && window.did_drop() && window.sample_count() == 0)
                        || window.event_count() >= self.window_samples
                        || now >= deadline
                });
                return;
            }
            if !drop_only {
                return;
            }
            let live = self.window();
            if !(live.did_drop() && live.sample_count() == 0) {
                return;
            }
        }
    }

    /// Swap out the live window if it is still `due`. A claimant that lost
    /// the window to an earlier roll finds a fresh one and leaves it alone.
    fn take_window(&self, due: impl Fn(&SampleWindow) -> bool) -> Option<Arc<SampleWindow>> {
        let fresh = Arc::new(SampleWindow::default());
        loop {
            let current = self.window.load_full();
            if !due(&current) {
                return None;
            }
            let previous = self.window.compare_and_swap(&current, Arc::clone(&fresh));
            if Arc::ptr_eq(&*previous, &current) {
                return Some(current);
            }
        }
    }

    fn roll(&self, due: impl Fn(&SampleWindow) -> bool) {
        let Some(algorithm) = &self.algorithm else {
            return;
        };
        let Some(window) = self.take_window(due) else {
            return;
        };
        if window.is_empty() {
            return;
        }

        let old = match self
            .limit
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(algorithm.update(current, &window))
            }) {
            Ok(previous) | Err(previous) => previous,
        };
        let new = algorithm.update(old, &window);

        if new != old {
            tracing::debug!(
                limiter = %self.name,
                old_limit = old,
                new_limit = new,
                window = %window,
                "Concurrency limit updated"
            );
            metrics::record_limit(&self.name, new);
        }
        if new > old {
            self.released.notify_waiters();
        }
    }

    fn now_nanos(&self) -> u64 {
        nanos(self.epoch.elapsed())
    }
}

fn nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
