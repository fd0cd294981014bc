//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt against an endpoint:
//!     → timeouts.rs (enforce per-attempt deadline)
//!     → On retryable outcome: backoff.rs (next delay, or give up)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Policies are shared and stateless; the retry position is per call
//! - Jitter shaves the delay so the cap is never exceeded

pub mod backoff;
pub mod timeouts;

pub use backoff::{Backoff, BackoffPolicy, ExponentialBackoff, FixedSchedule, NeverRetry};
