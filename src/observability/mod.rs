//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine, limiter and orchestrator produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Every log line for a call carries its call_id
//! - Metrics are cheap (atomic increments behind the facade)

pub mod logging;
pub mod metrics;
